//! Chart-ready series shapes.
//!
//! The dashboard's chart panels consume one of two shapes: a single named
//! y-series over x labels, or several named y-series sharing the same x
//! labels (stacked/overlay panels). The tag makes the shape explicit in the
//! JSON instead of leaving the consumer to sniff it. Gaps stay `null`,
//! never 0.

use crate::daily::DayAggregate;
use crate::histogram::HistogramBin;
use crate::load::TrainingLoadPoint;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One named y-series inside a stacked chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub values: Vec<Option<Decimal>>,
}

/// A chart payload, tagged by shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSeries {
    Single {
        name: String,
        labels: Vec<String>,
        values: Vec<Option<Decimal>>,
    },
    Stacked {
        labels: Vec<String>,
        series: Vec<NamedSeries>,
    },
}

fn date_labels(days: &[DayAggregate]) -> Vec<String> {
    days.iter()
        .map(|d| d.date.format("%Y-%m-%d").to_string())
        .collect()
}

/// Daily distance totals for the volume panel
pub fn day_distance(days: &[DayAggregate]) -> ChartSeries {
    ChartSeries::Single {
        name: "distance_km".to_string(),
        labels: date_labels(days),
        values: days.iter().map(|d| Some(d.distance_km)).collect(),
    }
}

/// Daily average pace; days without a resolvable pace stay `null`
pub fn day_pace(days: &[DayAggregate]) -> ChartSeries {
    ChartSeries::Single {
        name: "avg_pace".to_string(),
        labels: date_labels(days),
        values: days.iter().map(|d| d.avg_pace).collect(),
    }
}

/// Raw daily distance overlaid with its trailing-window mean
pub fn rolling_overlay(
    days: &[DayAggregate],
    rolling: &[Decimal],
    window: usize,
) -> ChartSeries {
    ChartSeries::Stacked {
        labels: date_labels(days),
        series: vec![
            NamedSeries {
                name: "distance_km".to_string(),
                values: days.iter().map(|d| Some(d.distance_km)).collect(),
            },
            NamedSeries {
                name: format!("rolling_{}d", window),
                values: rolling.iter().map(|v| Some(*v)).collect(),
            },
        ],
    }
}

/// Acute load, weekly-scale chronic load and their ratio, stacked on the
/// same date axis. The ratio is `null` until a chronic baseline exists.
pub fn load_series(points: &[TrainingLoadPoint]) -> ChartSeries {
    let labels = points
        .iter()
        .map(|p| p.date.format("%Y-%m-%d").to_string())
        .collect();

    ChartSeries::Stacked {
        labels,
        series: vec![
            NamedSeries {
                name: "acute".to_string(),
                values: points.iter().map(|p| Some(p.acute)).collect(),
            },
            NamedSeries {
                name: "chronic_weekly".to_string(),
                values: points.iter().map(|p| Some(p.chronic_weekly)).collect(),
            },
            NamedSeries {
                name: "ratio".to_string(),
                values: points.iter().map(|p| p.ratio).collect(),
            },
        ],
    }
}

/// Bin membership counts for the distance histogram panel
pub fn histogram_counts(bins: &[HistogramBin]) -> ChartSeries {
    ChartSeries::Single {
        name: "activity_count".to_string(),
        labels: bins.iter().map(|b| b.label.clone()).collect(),
        values: bins
            .iter()
            .map(|b| Some(Decimal::from(b.count as u64)))
            .collect(),
    }
}
