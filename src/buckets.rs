use crate::models::{Activity, SportFilter};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while assembling a bucket set
#[derive(Debug, Error)]
pub enum BucketError {
    #[error("Bucket '{new}' overlaps existing bucket '{existing}': centers within tolerance")]
    OverlappingBuckets { new: String, existing: String },
    #[error("Bucket '{0}' has a negative tolerance")]
    NegativeTolerance(String),
}

/// One target distance, matched as center ± tolerance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Display label, e.g. "10K"
    pub label: String,

    /// Target distance in kilometers
    pub center: Decimal,

    /// Maximum absolute deviation from the center
    pub tolerance: Decimal,
}

impl BucketConfig {
    pub fn new(label: &str, center: Decimal, tolerance: Decimal) -> Self {
        BucketConfig {
            label: label.to_string(),
            center,
            tolerance,
        }
    }

    /// Whether a resolved distance falls inside this bucket
    fn matches(&self, distance: Decimal) -> bool {
        (distance - self.center).abs() <= self.tolerance
    }
}

/// Ordered, conflict-checked collection of distance buckets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketSet {
    buckets: Vec<BucketConfig>,
}

impl BucketSet {
    pub fn new() -> Self {
        BucketSet {
            buckets: Vec::new(),
        }
    }

    /// Common road race distances. The spacing between centers is well
    /// beyond every tolerance, so the set is conflict-free.
    pub fn standard_road_distances() -> Self {
        BucketSet {
            buckets: vec![
                BucketConfig::new("5K", dec!(5), dec!(0.5)),
                BucketConfig::new("10K", dec!(10), dec!(1)),
                BucketConfig::new("Half marathon", dec!(21.1), dec!(1.5)),
                BucketConfig::new("Marathon", dec!(42.2), dec!(2.5)),
            ],
        }
    }

    /// Add a bucket, rejecting centers that sit within the larger of the
    /// two tolerances of an existing bucket. On rejection the set is left
    /// untouched.
    pub fn add(&mut self, bucket: BucketConfig) -> Result<(), BucketError> {
        if bucket.tolerance < Decimal::ZERO {
            return Err(BucketError::NegativeTolerance(bucket.label));
        }
        if let Some(existing) = self.buckets.iter().find(|b| {
            (b.center - bucket.center).abs() <= b.tolerance.max(bucket.tolerance)
        }) {
            return Err(BucketError::OverlappingBuckets {
                new: bucket.label,
                existing: existing.label.clone(),
            });
        }
        self.buckets.push(bucket);
        Ok(())
    }

    pub fn buckets(&self) -> &[BucketConfig] {
        &self.buckets
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// How a record that matches several buckets is assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMode {
    /// Single bucket with the smallest center distance, earliest declared
    /// bucket on ties
    Nearest,

    /// Every matching bucket counts the record independently
    All,
}

impl AssignmentMode {
    /// Parse a mode argument, case-insensitive
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg.to_lowercase().as_str() {
            "nearest" => Some(AssignmentMode::Nearest),
            "all" => Some(AssignmentMode::All),
            _ => None,
        }
    }
}

/// Pace and volume statistics for one bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    /// Label of the source bucket
    pub label: String,

    /// Center of the source bucket
    pub center: Decimal,

    /// Number of matched records
    pub count: usize,

    /// Paces of matched records in date order (records without a
    /// resolvable pace are counted but absent here)
    pub pace_series: Vec<Decimal>,

    /// Mean of the pace series
    pub mean_pace: Option<Decimal>,

    /// Median of the pace series, middle-two average for even counts
    pub median_pace: Option<Decimal>,

    /// Mean resolved distance of matched records
    pub mean_distance: Option<Decimal>,
}

/// Assigns activities to distance buckets and derives per-bucket pace stats
pub struct DistanceBucketMatcher {
    set: BucketSet,
    mode: AssignmentMode,
}

impl DistanceBucketMatcher {
    pub fn new(set: BucketSet, mode: AssignmentMode) -> Self {
        DistanceBucketMatcher { set, mode }
    }

    /// Match filtered activities against the bucket set.
    ///
    /// Every configured bucket appears in the output, in declaration order,
    /// even when nothing matched it. Records matching no bucket are dropped.
    pub fn match_activities(
        &self,
        activities: &[Activity],
        filter: &SportFilter,
    ) -> Vec<BucketStats> {
        let mut eligible: Vec<(&Activity, Decimal)> = activities
            .iter()
            .filter(|a| a.qualifies(filter))
            .filter_map(|a| a.resolved_distance().map(|d| (a, d)))
            .collect();
        // stable sort keeps input order within a day
        eligible.sort_by_key(|(a, _)| a.date);

        let mut accumulators: Vec<BucketAccumulator> = self
            .set
            .buckets()
            .iter()
            .map(BucketAccumulator::new)
            .collect();

        for (activity, distance) in eligible {
            match self.mode {
                AssignmentMode::Nearest => {
                    let nearest = self
                        .set
                        .buckets()
                        .iter()
                        .enumerate()
                        .filter(|(_, b)| b.matches(distance))
                        .min_by_key(|(_, b)| (distance - b.center).abs());
                    if let Some((index, _)) = nearest {
                        accumulators[index].add(activity, distance);
                    }
                }
                AssignmentMode::All => {
                    for (index, bucket) in self.set.buckets().iter().enumerate() {
                        if bucket.matches(distance) {
                            accumulators[index].add(activity, distance);
                        }
                    }
                }
            }
        }

        accumulators
            .into_iter()
            .map(BucketAccumulator::finish)
            .collect()
    }
}

/// Running totals for one bucket
struct BucketAccumulator {
    label: String,
    center: Decimal,
    count: usize,
    distance_sum: Decimal,
    pace_series: Vec<Decimal>,
}

impl BucketAccumulator {
    fn new(bucket: &BucketConfig) -> Self {
        BucketAccumulator {
            label: bucket.label.clone(),
            center: bucket.center,
            count: 0,
            distance_sum: Decimal::ZERO,
            pace_series: Vec::new(),
        }
    }

    fn add(&mut self, activity: &Activity, distance: Decimal) {
        self.count += 1;
        self.distance_sum += distance;
        if let Some(pace) = activity.resolved_pace() {
            self.pace_series.push(pace);
        }
    }

    fn finish(self) -> BucketStats {
        let mean_pace = if self.pace_series.is_empty() {
            None
        } else {
            Some(self.pace_series.iter().sum::<Decimal>() / Decimal::from(self.pace_series.len()))
        };

        BucketStats {
            label: self.label,
            center: self.center,
            count: self.count,
            median_pace: median(&self.pace_series),
            mean_pace,
            mean_distance: (self.count > 0)
                .then(|| self.distance_sum / Decimal::from(self.count)),
            pace_series: self.pace_series,
        }
    }
}

/// Median of a series; even lengths average the middle two.
fn median(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / Decimal::TWO)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn run(date: &str, distance: Decimal, pace: Option<Decimal>) -> Activity {
        Activity {
            id: None,
            sport: Some("Running".to_string()),
            date: date.parse::<NaiveDate>().unwrap(),
            distance_km: Some(distance),
            avg_pace: pace,
            duration_min: None,
            avg_hr: None,
            max_hr: None,
        }
    }

    fn ten_k_only() -> BucketSet {
        let mut set = BucketSet::new();
        set.add(BucketConfig::new("10K", dec!(10), dec!(1))).unwrap();
        set
    }

    #[test]
    fn test_tolerance_boundary() {
        let matcher = DistanceBucketMatcher::new(ten_k_only(), AssignmentMode::Nearest);
        let activities = vec![
            run("2024-03-01", dec!(10.9), Some(dec!(5))),
            run("2024-03-02", dec!(11.1), Some(dec!(5))),
        ];

        let stats = matcher.match_activities(&activities, &SportFilter::All);

        assert_eq!(stats[0].count, 1);
    }

    #[test]
    fn test_nearest_tie_prefers_earliest_declared() {
        let mut set = BucketSet::new();
        set.add(BucketConfig::new("Short", dec!(5), dec!(3))).unwrap();
        set.add(BucketConfig::new("Long", dec!(9), dec!(3))).unwrap();
        let matcher = DistanceBucketMatcher::new(set, AssignmentMode::Nearest);

        // 7 km is exactly 2 km from both centers
        let activities = vec![run("2024-03-01", dec!(7), Some(dec!(6)))];
        let stats = matcher.match_activities(&activities, &SportFilter::All);

        assert_eq!(stats[0].count, 1);
        assert_eq!(stats[1].count, 0);
    }

    #[test]
    fn test_all_mode_counts_every_candidate() {
        let mut set = BucketSet::new();
        set.add(BucketConfig::new("Short", dec!(5), dec!(3))).unwrap();
        set.add(BucketConfig::new("Long", dec!(9), dec!(3))).unwrap();
        let matcher = DistanceBucketMatcher::new(set, AssignmentMode::All);

        let activities = vec![run("2024-03-01", dec!(7), Some(dec!(6)))];
        let stats = matcher.match_activities(&activities, &SportFilter::All);

        assert_eq!(stats[0].count, 1);
        assert_eq!(stats[1].count, 1);
    }

    #[test]
    fn test_unmatched_records_dropped_silently() {
        let matcher =
            DistanceBucketMatcher::new(BucketSet::standard_road_distances(), AssignmentMode::All);
        let activities = vec![run("2024-03-01", dec!(100), Some(dec!(6)))];

        let stats = matcher.match_activities(&activities, &SportFilter::All);

        assert!(stats.iter().all(|s| s.count == 0));
        assert_eq!(stats.len(), 4);
    }

    #[test]
    fn test_overlapping_bucket_rejected_set_untouched() {
        let mut set = ten_k_only();

        let result = set.add(BucketConfig::new("10K-ish", dec!(10.5), dec!(1)));

        assert!(result.is_err());
        assert_eq!(set.buckets().len(), 1);
        assert_eq!(set.buckets()[0].label, "10K");
    }

    #[test]
    fn test_duplicate_center_rejected_even_with_zero_tolerance() {
        let mut set = BucketSet::new();
        set.add(BucketConfig::new("Half", dec!(21.1), dec!(0))).unwrap();

        assert!(set
            .add(BucketConfig::new("Half again", dec!(21.1), dec!(0)))
            .is_err());
    }

    #[test]
    fn test_distant_bucket_accepted() {
        let mut set = ten_k_only();
        assert!(set.add(BucketConfig::new("15K", dec!(15), dec!(1))).is_ok());
        assert_eq!(set.buckets().len(), 2);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let mut set = BucketSet::new();
        assert!(set
            .add(BucketConfig::new("Bad", dec!(5), dec!(-0.5)))
            .is_err());
    }

    #[test]
    fn test_pace_series_is_chronological() {
        let matcher = DistanceBucketMatcher::new(ten_k_only(), AssignmentMode::Nearest);
        let activities = vec![
            run("2024-03-05", dec!(10), Some(dec!(5.5))),
            run("2024-03-01", dec!(10.2), Some(dec!(6))),
            run("2024-03-03", dec!(9.8), Some(dec!(5))),
        ];

        let stats = matcher.match_activities(&activities, &SportFilter::All);

        assert_eq!(stats[0].pace_series, vec![dec!(6), dec!(5), dec!(5.5)]);
    }

    #[test]
    fn test_pace_stats_skip_paceless_records() {
        let matcher = DistanceBucketMatcher::new(ten_k_only(), AssignmentMode::Nearest);
        let activities = vec![
            run("2024-03-01", dec!(10), Some(dec!(5))),
            run("2024-03-02", dec!(10.4), None),
        ];

        let stats = matcher.match_activities(&activities, &SportFilter::All);

        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].pace_series, vec![dec!(5)]);
        assert_eq!(stats[0].mean_pace, Some(dec!(5)));
        assert_eq!(stats[0].mean_distance, Some(dec!(10.2)));
    }

    #[test]
    fn test_median_even_count_averages_middle_pair() {
        let matcher = DistanceBucketMatcher::new(ten_k_only(), AssignmentMode::Nearest);
        let activities = vec![
            run("2024-03-01", dec!(10), Some(dec!(4))),
            run("2024-03-02", dec!(10), Some(dec!(10))),
            run("2024-03-03", dec!(10), Some(dec!(8))),
            run("2024-03-04", dec!(10), Some(dec!(6))),
        ];

        let stats = matcher.match_activities(&activities, &SportFilter::All);

        assert_eq!(stats[0].median_pace, Some(dec!(7)));
        assert_eq!(stats[0].mean_pace, Some(dec!(7)));
    }

    #[test]
    fn test_median_odd_count() {
        let matcher = DistanceBucketMatcher::new(ten_k_only(), AssignmentMode::Nearest);
        let activities = vec![
            run("2024-03-01", dec!(10), Some(dec!(4))),
            run("2024-03-02", dec!(10), Some(dec!(9))),
            run("2024-03-03", dec!(10), Some(dec!(5))),
        ];

        let stats = matcher.match_activities(&activities, &SportFilter::All);

        assert_eq!(stats[0].median_pace, Some(dec!(5)));
    }

    #[test]
    fn test_sport_filter_applies() {
        let matcher = DistanceBucketMatcher::new(ten_k_only(), AssignmentMode::Nearest);
        let mut ride = run("2024-03-01", dec!(10), Some(dec!(3)));
        ride.sport = Some("Cycling".to_string());
        let activities = vec![ride, run("2024-03-02", dec!(10), Some(dec!(5)))];

        let stats =
            matcher.match_activities(&activities, &SportFilter::Only("running".to_string()));

        assert_eq!(stats[0].count, 1);
        assert_eq!(stats[0].pace_series, vec![dec!(5)]);
    }

    #[test]
    fn test_assignment_mode_parsing() {
        assert_eq!(AssignmentMode::from_arg("nearest"), Some(AssignmentMode::Nearest));
        assert_eq!(AssignmentMode::from_arg("ALL"), Some(AssignmentMode::All));
        assert_eq!(AssignmentMode::from_arg("closest"), None);
    }
}
