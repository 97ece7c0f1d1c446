use crate::models::{Activity, SportFilter};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-day aggregate of qualifying activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAggregate {
    /// Calendar date
    pub date: NaiveDate,

    /// Total distance that day in kilometers
    pub distance_km: Decimal,

    /// Unweighted mean of per-activity average paces (min/km)
    pub avg_pace: Option<Decimal>,

    /// Unweighted mean of per-activity speeds (km/h)
    pub avg_speed: Option<Decimal>,

    /// Number of qualifying activities that day
    pub activity_count: u16,
}

/// Running totals for one date while folding
#[derive(Debug, Default)]
struct DayAccumulator {
    distance: Decimal,
    pace_sum: Decimal,
    speed_sum: Decimal,
    pace_count: u16,
    activity_count: u16,
}

impl DayAccumulator {
    fn add(&mut self, activity: &Activity) {
        // qualification guarantees a positive distance
        if let Some(distance) = activity.resolved_distance() {
            self.distance += distance;
        }
        self.activity_count += 1;

        if let Some(pace) = activity.resolved_pace() {
            self.pace_sum += pace;
            self.speed_sum += Decimal::from(60) / pace;
            self.pace_count += 1;
        }
    }

    fn finish(self, date: NaiveDate) -> DayAggregate {
        let (avg_pace, avg_speed) = if self.pace_count > 0 {
            let n = Decimal::from(self.pace_count);
            (Some(self.pace_sum / n), Some(self.speed_sum / n))
        } else {
            (None, None)
        };

        DayAggregate {
            date,
            distance_km: self.distance,
            avg_pace,
            avg_speed,
            activity_count: self.activity_count,
        }
    }
}

/// Groups activity records by calendar date
///
/// The day's pace is the unweighted mean of per-activity average paces —
/// each activity counts once regardless of its distance. The rest of the
/// dashboard assumes this semantics, so it is not distance-weighted here.
pub struct DayAggregator;

impl DayAggregator {
    /// Fold activities into one aggregate per distinct date, ascending.
    ///
    /// Records without a positive distance, strength-training records, and
    /// records rejected by the filter contribute nothing. A date whose
    /// records resolve no pace still sums its distance and reports `None`
    /// for pace and speed.
    pub fn aggregate(activities: &[Activity], filter: &SportFilter) -> Vec<DayAggregate> {
        let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

        for activity in activities {
            if !activity.qualifies(filter) {
                continue;
            }
            days.entry(activity.date).or_default().add(activity);
        }

        days.into_iter()
            .map(|(date, acc)| acc.finish(date))
            .collect()
    }
}
