//! Unified error hierarchy for fitdash
//!
//! Wraps the per-module error types into one top-level enum with severity
//! classification and user-facing messages for the CLI.

use crate::buckets::BucketError;
use crate::correlate::CorrelationError;
use crate::export::ExportError;
use crate::histogram::HistogramError;
use crate::load::LoadError;
use crate::rolling::RollingError;
use thiserror::Error;

/// Top-level error type for all fitdash operations
#[derive(Debug, Error)]
pub enum FitdashError {
    /// Histogram configuration errors
    #[error("Histogram error: {0}")]
    Histogram(#[from] HistogramError),

    /// Rolling statistics parameter errors
    #[error("Rolling statistics error: {0}")]
    Rolling(#[from] RollingError),

    /// Training load window errors
    #[error("Training load error: {0}")]
    Load(#[from] LoadError),

    /// Distance bucket configuration errors
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),

    /// Metric table construction errors
    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for fitdash operations
pub type Result<T> = std::result::Result<T, FitdashError>;

impl FitdashError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FitdashError::Bucket(_) => ErrorSeverity::Warning,
            FitdashError::Validation(_) => ErrorSeverity::Warning,
            FitdashError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            FitdashError::Bucket(BucketError::OverlappingBuckets { new, existing }) => {
                format!(
                    "Bucket '{}' sits too close to '{}'. Move the centers apart or shrink the tolerances.",
                    new, existing
                )
            }
            FitdashError::Load(LoadError::InvalidWindow) => {
                "Training load windows must cover at least one entry.".to_string()
            }
            FitdashError::Rolling(RollingError::InvalidWindow) => {
                "The rolling window must cover at least one day.".to_string()
            }
            FitdashError::Configuration(reason) => {
                format!("Configuration problem: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
