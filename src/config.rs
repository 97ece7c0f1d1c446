use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::buckets::{AssignmentMode, BucketConfig, BucketSet};
use crate::histogram::HistogramConfig;
use crate::load::LoadConfig;
use crate::logging::LogConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// General analysis settings
    pub settings: AppSettings,

    /// Histogram binning settings
    pub histogram: HistogramConfig,

    /// Rolling statistics settings
    pub rolling: RollingSettings,

    /// Training load window settings
    pub load: LoadConfig,

    /// Distance bucket definitions
    pub buckets: Vec<BucketConfig>,

    /// Logging settings
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General analysis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Sport to analyze when the CLI does not name one (None = all)
    pub sport_filter: Option<String>,

    /// How records matching several buckets are assigned
    pub assignment_mode: AssignmentMode,
}

/// Rolling statistics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingSettings {
    /// Trailing window length in days
    pub window: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            histogram: HistogramConfig::default(),
            rolling: RollingSettings::default(),
            load: LoadConfig::default(),
            buckets: BucketSet::standard_road_distances().buckets().to_vec(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            sport_filter: None,
            assignment_mode: AssignmentMode::Nearest,
        }
    }
}

impl Default for RollingSettings {
    fn default() -> Self {
        RollingSettings { window: 7 }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        // Update modification timestamp
        self.metadata.updated_at = Utc::now();

        // Create directory if it doesn't exist
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fitdash")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }

    /// Check every section for values the analyzers would reject
    pub fn validate(&self) -> Result<()> {
        self.histogram
            .validate()
            .map_err(|e| anyhow::anyhow!("histogram: {e}"))?;
        if self.rolling.window == 0 {
            anyhow::bail!("rolling: window must be at least 1");
        }
        if self.load.acute_window == 0 || self.load.chronic_window == 0 {
            anyhow::bail!("load: windows must cover at least 1 entry");
        }
        self.bucket_set()?;
        Ok(())
    }

    /// Build the validated bucket set from the configured definitions
    pub fn bucket_set(&self) -> Result<BucketSet> {
        let mut set = BucketSet::new();
        for bucket in &self.buckets {
            set.add(bucket.clone())
                .map_err(|e| anyhow::anyhow!("buckets: {e}"))?;
        }
        Ok(set)
    }
}
