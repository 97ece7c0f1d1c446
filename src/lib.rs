// Library interface for the fitdash analysis modules
// This allows integration tests to access the core functionality

pub mod buckets;
pub mod config;
pub mod correlate;
pub mod daily;
pub mod error;
pub mod export;
pub mod histogram;
pub mod import;
pub mod load;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod rolling;

// Re-export commonly used types for convenience
pub use models::*;
pub use daily::{DayAggregate, DayAggregator};
pub use histogram::{HistogramBin, HistogramBinner, HistogramConfig, HistogramSample};
pub use rolling::{RollingStatsEngine, TrendLine};
pub use load::{LoadConfig, RiskZone, TrainingLoadCalculator, TrainingLoadPoint};
pub use buckets::{
    AssignmentMode, BucketConfig, BucketSet, BucketStats, DistanceBucketMatcher,
};
pub use correlate::{CorrelationEngine, CorrelationMatrix, MetricTable};
pub use export::{DashboardReport, DateRange, ExportFormat, ReportBuilder};
pub use error::{FitdashError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
