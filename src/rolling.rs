use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rolling statistics parameter errors
#[derive(Debug, Error)]
pub enum RollingError {
    #[error("Window length must be at least 1")]
    InvalidWindow,
}

/// Fitted least-squares line over an index-aligned series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    /// Change in value per series index
    pub slope: Decimal,

    /// Fitted value at index 0
    pub intercept: Decimal,

    /// Fitted value at every index of the input, gaps included
    pub fitted: Vec<Decimal>,

    /// True when the fit rests on at least 3 observations
    pub reliable: bool,
}

impl TrendLine {
    /// Fitted value extrapolated to an arbitrary index
    pub fn value_at(&self, index: usize) -> Decimal {
        self.intercept + self.slope * Decimal::from(index)
    }
}

/// Trailing-window smoothing and trend fitting over sparse daily series
pub struct RollingStatsEngine;

impl RollingStatsEngine {
    /// Trailing mean of width `window` at every index.
    ///
    /// A gap (`None`) contributes zero to the sum but still occupies its
    /// slot, so the divisor is the slot count of the window. The window
    /// shrinks at the start of the series and never looks ahead.
    pub fn rolling_average(
        values: &[Option<Decimal>],
        window: usize,
    ) -> Result<Vec<Decimal>, RollingError> {
        if window == 0 {
            return Err(RollingError::InvalidWindow);
        }

        let mut averages = Vec::with_capacity(values.len());
        for i in 0..values.len() {
            let start = (i + 1).saturating_sub(window);
            let sum: Decimal = values[start..=i]
                .iter()
                .map(|v| v.unwrap_or(Decimal::ZERO))
                .sum();
            let slots = i - start + 1;
            averages.push(sum / Decimal::from(slots));
        }
        Ok(averages)
    }

    /// Closed-form least-squares fit of value against 0-based index.
    ///
    /// Gap entries are excluded from the fit entirely rather than
    /// zero-filled. Returns `None` with fewer than 2 observations.
    pub fn linear_trend(values: &[Option<Decimal>]) -> Option<TrendLine> {
        let points: Vec<(Decimal, Decimal)> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|y| (Decimal::from(i), y)))
            .collect();

        if points.len() < 2 {
            return None;
        }

        let n = Decimal::from(points.len());
        let sum_x: Decimal = points.iter().map(|(x, _)| *x).sum();
        let sum_y: Decimal = points.iter().map(|(_, y)| *y).sum();
        let sum_xx: Decimal = points.iter().map(|(x, _)| x * x).sum();
        let sum_xy: Decimal = points.iter().map(|(x, y)| x * y).sum();

        let denominator = n * sum_xx - sum_x * sum_x;
        let (slope, intercept) = if denominator == Decimal::ZERO {
            // degenerate x spread: flat line through the mean
            (Decimal::ZERO, sum_y / n)
        } else {
            let slope = (n * sum_xy - sum_x * sum_y) / denominator;
            (slope, (sum_y - slope * sum_x) / n)
        };

        let fitted = (0..values.len())
            .map(|i| intercept + slope * Decimal::from(i))
            .collect();

        Some(TrendLine {
            slope,
            intercept,
            fitted,
            reliable: points.len() >= 3,
        })
    }
}
