use crate::buckets::{BucketStats, BucketSet, DistanceBucketMatcher};
use crate::config::AppConfig;
use crate::correlate::{self, CorrelationEngine, CorrelationMatrix};
use crate::daily::{DayAggregate, DayAggregator};
use crate::histogram::{HistogramBin, HistogramBinner, HistogramSample};
use crate::load::{TrainingLoadCalculator, TrainingLoadPoint};
use crate::models::{Activity, SportFilter};
use crate::rolling::{RollingStatsEngine, TrendLine};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub mod csv;
pub mod json;
pub mod series;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self, ExportError> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }

    /// Pick the format from an output path's extension
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ExportError::UnsupportedFormat(path.display().to_string()))?;
        Self::from_str(ext)
    }
}

/// Date range filter for exports and reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    /// Check if a date falls within this range
    pub fn contains(&self, date: &NaiveDate) -> bool {
        let after_start = self.start.map_or(true, |start| date >= &start);
        let before_end = self.end.map_or(true, |end| date <= &end);
        after_start && before_end
    }

    /// Filter activities by date range
    pub fn filter_activities<'a>(&self, activities: &'a [Activity]) -> Vec<&'a Activity> {
        activities.iter().filter(|a| self.contains(&a.date)).collect()
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Full dashboard payload: every panel's data in one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub sport: Option<String>,
    pub date_range: DateRange,
    pub days: Vec<DayAggregate>,
    pub rolling_distance: Vec<Decimal>,
    pub distance_trend: Option<TrendLine>,
    pub pace_trend: Option<TrendLine>,
    pub histogram: Vec<HistogramBin>,
    pub load: Vec<TrainingLoadPoint>,
    pub buckets: Vec<BucketStats>,
    pub correlation: Option<CorrelationMatrix>,
}

/// Assembles dashboard reports from normalized activities
pub struct ReportBuilder {
    config: AppConfig,
}

impl ReportBuilder {
    pub fn new(config: AppConfig) -> Self {
        ReportBuilder { config }
    }

    /// Run every analysis pass over the activities and bundle the results.
    ///
    /// Empty input is not an error: every panel comes back empty or `None`
    /// and the report is still well formed.
    pub fn build(
        &self,
        activities: &[Activity],
        date_range: &DateRange,
    ) -> crate::error::Result<DashboardReport> {
        let in_range: Vec<Activity> = date_range
            .filter_activities(activities)
            .into_iter()
            .cloned()
            .collect();

        let filter = SportFilter::from_arg(self.config.settings.sport_filter.as_deref());
        let days = DayAggregator::aggregate(&in_range, &filter);

        let distances: Vec<Option<Decimal>> =
            days.iter().map(|d| Some(d.distance_km)).collect();
        let paces: Vec<Option<Decimal>> = days.iter().map(|d| d.avg_pace).collect();

        let rolling_distance =
            RollingStatsEngine::rolling_average(&distances, self.config.rolling.window)?;
        let distance_trend = RollingStatsEngine::linear_trend(&distances);
        let pace_trend = RollingStatsEngine::linear_trend(&paces);

        let samples: Vec<HistogramSample> = days.iter().map(HistogramSample::from).collect();
        let histogram = HistogramBinner::new(self.config.histogram.clone())?.bin(&samples);

        let load = TrainingLoadCalculator::with_config(self.config.load.clone())
            .calculate_series(&days)?;

        let mut set = BucketSet::new();
        for bucket in &self.config.buckets {
            set.add(bucket.clone())?;
        }
        let buckets = DistanceBucketMatcher::new(set, self.config.settings.assignment_mode)
            .match_activities(&in_range, &filter);

        let correlation = CorrelationEngine::matrix(&correlate::weekday_profile(&days));

        tracing::debug!(
            activities = in_range.len(),
            days = days.len(),
            "assembled dashboard report"
        );

        Ok(DashboardReport {
            generated_at: chrono::Utc::now(),
            sport: self.config.settings.sport_filter.clone(),
            date_range: date_range.clone(),
            days,
            rolling_distance,
            distance_trend,
            pace_trend,
            histogram,
            load,
            buckets,
            correlation,
        })
    }
}
