use crate::daily::DayAggregate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Histogram configuration errors
#[derive(Debug, Error)]
pub enum HistogramError {
    #[error("Bin width must be positive, got {0}")]
    InvalidBinWidth(Decimal),
    #[error("Max bins must be at least 1")]
    InvalidMaxBins,
}

/// Histogram binning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramConfig {
    /// Width of each uniform bin in kilometers
    pub bin_width: Decimal,

    /// Upper bound on the number of uniform bins
    pub max_bins: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        HistogramConfig {
            bin_width: Decimal::TWO,
            max_bins: 25,
        }
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> Result<(), HistogramError> {
        if self.bin_width <= Decimal::ZERO {
            return Err(HistogramError::InvalidBinWidth(self.bin_width));
        }
        if self.max_bins == 0 {
            return Err(HistogramError::InvalidMaxBins);
        }
        Ok(())
    }
}

/// One value to be binned, with the auxiliary stats carried alongside
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSample {
    pub value: Decimal,
    pub pace: Option<Decimal>,
    pub speed: Option<Decimal>,
}

impl From<&DayAggregate> for HistogramSample {
    fn from(day: &DayAggregate) -> Self {
        HistogramSample {
            value: day.distance_km,
            pace: day.avg_pace,
            speed: day.avg_speed,
        }
    }
}

/// One distribution bin, chart-ready
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Display label, `"{lo}-{hi} km"` or `"{lo}+ km"` for an open tail
    pub label: String,

    /// Inclusive lower edge
    pub lower: Decimal,

    /// Exclusive upper edge (inclusive for the final bin)
    pub upper: Decimal,

    /// Number of samples in this bin
    pub count: usize,

    /// Sum of the binned values
    pub total_value: Decimal,

    /// Mean pace over members carrying one
    pub avg_pace: Option<Decimal>,

    /// Mean speed over members carrying one
    pub avg_speed: Option<Decimal>,
}

/// Assigns values to variable-width distribution bins
///
/// Edges are uniform while the data fits `bin_width * max_bins`; beyond
/// that the uniform ladder stops at a 100 km cutoff and two wide terminal
/// edges (150, 200 km) absorb ultra-distance outliers.
pub struct HistogramBinner {
    config: HistogramConfig,
}

impl HistogramBinner {
    /// Uniform edges stop here when the data is heavy-tailed
    const UNIFORM_CUTOFF_KM: u32 = 100;

    /// Wide terminal edges appended in the heavy-tailed case
    const EXTENDED_EDGES_KM: [u32; 2] = [150, 200];

    pub fn new(config: HistogramConfig) -> Result<Self, HistogramError> {
        config.validate()?;
        Ok(HistogramBinner { config })
    }

    /// Bin the samples; every sample lands in exactly one bin.
    ///
    /// Values at or beyond the last edge fall into the final bin, which is
    /// then labeled open-ended when anything actually exceeds the edges.
    pub fn bin(&self, samples: &[HistogramSample]) -> Vec<HistogramBin> {
        if samples.is_empty() {
            return Vec::new();
        }

        let max_value = samples
            .iter()
            .map(|s| s.value)
            .max()
            .unwrap_or(Decimal::ZERO);

        let edges = self.edges(max_value);
        let last_edge = edges[edges.len() - 1];
        let open_tail = samples.iter().any(|s| s.value > last_edge);

        let mut bins: Vec<BinAccumulator> = edges
            .windows(2)
            .map(|pair| BinAccumulator::new(pair[0], pair[1]))
            .collect();
        let last = bins.len() - 1;

        for sample in samples {
            let index = edges
                .windows(2)
                .position(|pair| sample.value >= pair[0] && sample.value < pair[1])
                // at or beyond the last edge (or below zero): terminal bin
                .unwrap_or(if sample.value >= last_edge { last } else { 0 });
            bins[index].add(sample);
        }

        bins.into_iter()
            .enumerate()
            .map(|(i, acc)| acc.finish(i == last && open_tail))
            .collect()
    }

    /// Generate bin edges covering `[0, max_value]`.
    fn edges(&self, max_value: Decimal) -> Vec<Decimal> {
        let width = self.config.bin_width;
        let capacity = width * Decimal::from(self.config.max_bins);

        if max_value <= capacity {
            let needed = (max_value / width)
                .ceil()
                .to_usize()
                .unwrap_or(self.config.max_bins);
            let count = needed.clamp(1, self.config.max_bins);
            return (0..=count).map(|i| width * Decimal::from(i)).collect();
        }

        // Heavy-tailed data: uniform ladder up to the cutoff, then wide
        // terminal buckets.
        let cutoff = Decimal::from(Self::UNIFORM_CUTOFF_KM);
        let mut edges = Vec::new();
        let mut edge = Decimal::ZERO;
        while edge <= cutoff {
            edges.push(edge);
            edge += width;
        }
        for extended in Self::EXTENDED_EDGES_KM {
            edges.push(Decimal::from(extended));
        }
        edges.sort();
        edges.dedup();
        edges
    }
}

/// Running totals for one bin
struct BinAccumulator {
    lower: Decimal,
    upper: Decimal,
    count: usize,
    total_value: Decimal,
    pace_sum: Decimal,
    pace_count: usize,
    speed_sum: Decimal,
    speed_count: usize,
}

impl BinAccumulator {
    fn new(lower: Decimal, upper: Decimal) -> Self {
        BinAccumulator {
            lower,
            upper,
            count: 0,
            total_value: Decimal::ZERO,
            pace_sum: Decimal::ZERO,
            pace_count: 0,
            speed_sum: Decimal::ZERO,
            speed_count: 0,
        }
    }

    fn add(&mut self, sample: &HistogramSample) {
        self.count += 1;
        self.total_value += sample.value;
        if let Some(pace) = sample.pace {
            self.pace_sum += pace;
            self.pace_count += 1;
        }
        if let Some(speed) = sample.speed {
            self.speed_sum += speed;
            self.speed_count += 1;
        }
    }

    fn finish(self, open_tail: bool) -> HistogramBin {
        let label = if open_tail {
            format!("{}+ km", self.lower.normalize())
        } else {
            format!("{}-{} km", self.lower.normalize(), self.upper.normalize())
        };

        HistogramBin {
            label,
            lower: self.lower,
            upper: self.upper,
            count: self.count,
            total_value: self.total_value,
            avg_pace: (self.pace_count > 0)
                .then(|| self.pace_sum / Decimal::from(self.pace_count)),
            avg_speed: (self.speed_count > 0)
                .then(|| self.speed_sum / Decimal::from(self.speed_count)),
        }
    }
}
