use crate::daily::DayAggregate;
use chrono::Datelike;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metric table construction errors
#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error("Metric '{name}' has {actual} values, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Metric '{0}' is already present")]
    DuplicateMetric(String),
}

/// Insertion-ordered collection of equal-length metric series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    names: Vec<String>,
    series: Vec<Vec<Decimal>>,
}

impl MetricTable {
    pub fn new() -> Self {
        MetricTable {
            names: Vec::new(),
            series: Vec::new(),
        }
    }

    /// Add a named series. Its length must match the series already
    /// present; on rejection the table is left untouched.
    pub fn insert(&mut self, name: &str, values: Vec<Decimal>) -> Result<(), CorrelationError> {
        if self.names.iter().any(|n| n == name) {
            return Err(CorrelationError::DuplicateMetric(name.to_string()));
        }
        if let Some(expected) = self.series.first().map(Vec::len) {
            if values.len() != expected {
                return Err(CorrelationError::LengthMismatch {
                    name: name.to_string(),
                    expected,
                    actual: values.len(),
                });
            }
        }
        self.names.push(name.to_string());
        self.series.push(values);
        Ok(())
    }

    pub fn metric_count(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Square Pearson matrix over the table's metrics, insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Metric names labeling both axes
    pub metrics: Vec<String>,

    /// `values[i][j]` = correlation between metric i and metric j
    pub values: Vec<Vec<Decimal>>,
}

impl CorrelationMatrix {
    /// Look up the coefficient for a metric pair by name
    pub fn get(&self, a: &str, b: &str) -> Option<Decimal> {
        let i = self.metrics.iter().position(|m| m == a)?;
        let j = self.metrics.iter().position(|m| m == b)?;
        Some(self.values[i][j])
    }
}

/// Pairwise Pearson correlation over a metric table
pub struct CorrelationEngine;

impl CorrelationEngine {
    /// Build the full matrix.
    ///
    /// Returns `None` with fewer than 2 metrics. The diagonal is exactly 1
    /// and any zero-variance pairing yields 0 rather than NaN.
    pub fn matrix(table: &MetricTable) -> Option<CorrelationMatrix> {
        let n = table.metric_count();
        if n < 2 {
            return None;
        }

        let mut values = vec![vec![Decimal::ZERO; n]; n];
        for i in 0..n {
            values[i][i] = Decimal::ONE;
            for j in (i + 1)..n {
                let r = Self::pearson(&table.series[i], &table.series[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Some(CorrelationMatrix {
            metrics: table.names.clone(),
            values,
        })
    }

    /// Pearson r between two equal-length series; 0 when either side has
    /// no variance (or fewer than 2 observations).
    fn pearson(a: &[Decimal], b: &[Decimal]) -> Decimal {
        if a.len() < 2 {
            return Decimal::ZERO;
        }

        let n = Decimal::from(a.len());
        let mean_a: Decimal = a.iter().sum::<Decimal>() / n;
        let mean_b: Decimal = b.iter().sum::<Decimal>() / n;

        let mut covariance = Decimal::ZERO;
        let mut variance_a = Decimal::ZERO;
        let mut variance_b = Decimal::ZERO;
        for (x, y) in a.iter().zip(b) {
            let da = x - mean_a;
            let db = y - mean_b;
            covariance += da * db;
            variance_a += da * da;
            variance_b += db * db;
        }

        if variance_a == Decimal::ZERO || variance_b == Decimal::ZERO {
            return Decimal::ZERO;
        }

        let denominator = Decimal::from_f64_retain(
            (variance_a * variance_b).to_f64().unwrap_or(0.0).sqrt(),
        )
        .unwrap_or_default();
        if denominator == Decimal::ZERO {
            return Decimal::ZERO;
        }
        covariance / denominator
    }
}

/// Per-weekday training profile as a metric table.
///
/// The series dimension is Monday through Sunday. A metric joins the table
/// only when it is defined for all 7 weekdays: mean distance and mean pace
/// need at least one qualifying day per weekday, the activity count is
/// always defined (0 for an empty weekday).
pub fn weekday_profile(days: &[DayAggregate]) -> MetricTable {
    let mut distances: [Vec<Decimal>; 7] = Default::default();
    let mut paces: [Vec<Decimal>; 7] = Default::default();
    let mut counts = [Decimal::ZERO; 7];

    for day in days {
        let weekday = day.date.weekday().num_days_from_monday() as usize;
        distances[weekday].push(day.distance_km);
        if let Some(pace) = day.avg_pace {
            paces[weekday].push(pace);
        }
        counts[weekday] += Decimal::from(day.activity_count);
    }

    let mut table = MetricTable::new();
    if let Some(series) = complete_means(&distances) {
        // names are unique and lengths all 7, insertion cannot fail
        let _ = table.insert("distance", series);
    }
    if let Some(series) = complete_means(&paces) {
        let _ = table.insert("pace", series);
    }
    let _ = table.insert("activities", counts.to_vec());
    table
}

/// Mean per weekday, or `None` when any weekday has no observations.
fn complete_means(per_weekday: &[Vec<Decimal>; 7]) -> Option<Vec<Decimal>> {
    per_weekday
        .iter()
        .map(|values| {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<Decimal>() / Decimal::from(values.len()))
            }
        })
        .collect()
}
