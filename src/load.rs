use crate::daily::DayAggregate;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Training load calculation errors
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Load windows must cover at least 1 entry")]
    InvalidWindow,
}

/// Window lengths for load accumulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Entries in the acute (fatigue) window
    pub acute_window: u16,

    /// Entries in the chronic (fitness) window
    pub chronic_window: u16,
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            acute_window: 7,
            chronic_window: 28,
        }
    }
}

/// Daily training load metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingLoadPoint {
    /// Date this point describes
    pub date: NaiveDate,

    /// Distance sum over the acute window
    pub acute: Decimal,

    /// Distance sum over the chronic window
    pub chronic: Decimal,

    /// Chronic sum scaled to one acute window
    pub chronic_weekly: Decimal,

    /// Acute:chronic workload ratio, None until the chronic base is positive
    pub ratio: Option<Decimal>,

    /// Mean / sample stddev of the acute-window distances (Foster)
    pub monotony: Option<Decimal>,

    /// Acute load weighted by monotony
    pub strain: Option<Decimal>,
}

/// Workload-ratio risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskZone {
    UnderTraining, // below 0.7
    Optimal,       // 0.7 to 1.3
    Elevated,      // 1.3 to 1.5
    High,          // 1.5 to 2.0
    VeryHigh,      // 2.0 and above
}

impl RiskZone {
    /// Classify an acute:chronic workload ratio
    pub fn from_ratio(ratio: Decimal) -> Self {
        if ratio >= dec!(2.0) {
            RiskZone::VeryHigh
        } else if ratio >= dec!(1.5) {
            RiskZone::High
        } else if ratio >= dec!(1.3) {
            RiskZone::Elevated
        } else if ratio >= dec!(0.7) {
            RiskZone::Optimal
        } else {
            RiskZone::UnderTraining
        }
    }

    /// Get zone description
    pub fn description(&self) -> &'static str {
        match self {
            RiskZone::UnderTraining => "Under-training (load well below recent base)",
            RiskZone::Optimal => "Optimal load (sweet spot)",
            RiskZone::Elevated => "Elevated load (monitor closely)",
            RiskZone::High => "High load (injury risk rising)",
            RiskZone::VeryHigh => "Very high load (sharp spike over base)",
        }
    }

    /// Get training recommendation
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskZone::UnderTraining => "Room to build volume gradually",
            RiskZone::Optimal => "Continue current training progression",
            RiskZone::Elevated => "Hold volume steady, avoid further spikes",
            RiskZone::High => "Reduce volume toward the recent base",
            RiskZone::VeryHigh => "Back off sharply and recover before rebuilding",
        }
    }
}

/// Calculates acute/chronic load, monotony and strain from daily aggregates
pub struct TrainingLoadCalculator {
    config: LoadConfig,
}

impl Default for TrainingLoadCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingLoadCalculator {
    /// Create new load calculator with default windows
    pub fn new() -> Self {
        TrainingLoadCalculator {
            config: LoadConfig::default(),
        }
    }

    /// Create new load calculator with custom windows
    pub fn with_config(config: LoadConfig) -> Self {
        TrainingLoadCalculator { config }
    }

    /// Calculate one load point per input day.
    ///
    /// Days must be ascending by date. Windows slide over the entries that
    /// exist; rest days absent from the input do not occupy window slots,
    /// so a sparse week reads as a denser one.
    pub fn calculate_series(
        &self,
        days: &[DayAggregate],
    ) -> Result<Vec<TrainingLoadPoint>, LoadError> {
        if self.config.acute_window == 0 || self.config.chronic_window == 0 {
            return Err(LoadError::InvalidWindow);
        }

        let acute_window = self.config.acute_window as usize;
        let chronic_window = self.config.chronic_window as usize;
        let window_scale =
            Decimal::from(self.config.chronic_window) / Decimal::from(self.config.acute_window);

        let mut series = Vec::with_capacity(days.len());
        for i in 0..days.len() {
            let acute_start = (i + 1).saturating_sub(acute_window);
            let chronic_start = (i + 1).saturating_sub(chronic_window);

            let acute: Decimal = days[acute_start..=i].iter().map(|d| d.distance_km).sum();
            let chronic: Decimal = days[chronic_start..=i].iter().map(|d| d.distance_km).sum();
            let chronic_weekly = chronic / window_scale;

            let ratio = if chronic_weekly > Decimal::ZERO {
                Some(acute / chronic_weekly)
            } else {
                None
            };

            let monotony = Self::monotony(&days[acute_start..=i]);
            let strain = monotony.map(|m| acute * m);

            series.push(TrainingLoadPoint {
                date: days[i].date,
                acute,
                chronic,
                chronic_weekly,
                ratio,
                monotony,
                strain,
            });
        }

        Ok(series)
    }

    /// Foster monotony over one acute window: mean / sample stddev.
    ///
    /// Undefined for fewer than 2 entries or perfectly even loading.
    fn monotony(window: &[DayAggregate]) -> Option<Decimal> {
        if window.len() < 2 {
            return None;
        }

        let n = Decimal::from(window.len());
        let mean: Decimal = window.iter().map(|d| d.distance_km).sum::<Decimal>() / n;
        let variance = window
            .iter()
            .map(|d| {
                let diff = d.distance_km - mean;
                diff * diff
            })
            .sum::<Decimal>()
            / (n - Decimal::ONE);

        let std_dev =
            Decimal::from_f64_retain(variance.to_f64().unwrap_or(0.0).sqrt()).unwrap_or_default();
        if std_dev > Decimal::ZERO {
            Some(mean / std_dev)
        } else {
            None
        }
    }
}
