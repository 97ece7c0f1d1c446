use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Broad activity categories derived from the free-form sport string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SportClass {
    Running,
    Walking,
    Cycling,
    Swimming,
    StrengthTraining,
    Other,
}

impl SportClass {
    /// Classify a raw sport string by keyword.
    ///
    /// Matching is case-insensitive substring matching. Strength work is
    /// checked first because it is excluded from distance aggregation no
    /// matter what else the string says.
    pub fn classify(sport: &str) -> SportClass {
        let s = sport.to_lowercase();
        if s.contains("gym") || s.contains("strength") || s.contains("weight") {
            SportClass::StrengthTraining
        } else if s.contains("run") || s.contains("jog") {
            SportClass::Running
        } else if s.contains("walk") || s.contains("hik") {
            SportClass::Walking
        } else if s.contains("cycl") || s.contains("bike") || s.contains("ride") {
            SportClass::Cycling
        } else if s.contains("swim") {
            SportClass::Swimming
        } else {
            SportClass::Other
        }
    }
}

/// Sport filter applied before aggregation
///
/// `All` (the `"all"` keyword or an absent argument) keeps every record;
/// `Only` keeps records whose sport string matches exactly,
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SportFilter {
    All,
    Only(String),
}

impl SportFilter {
    /// Build a filter from an optional CLI/config argument
    pub fn from_arg(arg: Option<&str>) -> SportFilter {
        match arg {
            None => SportFilter::All,
            Some(s) if s.eq_ignore_ascii_case("all") => SportFilter::All,
            Some(s) => SportFilter::Only(s.to_string()),
        }
    }

    /// Check whether a record's sport string passes this filter
    pub fn matches(&self, sport: Option<&str>) -> bool {
        match self {
            SportFilter::All => true,
            SportFilter::Only(wanted) => {
                sport.is_some_and(|s| s.eq_ignore_ascii_case(wanted))
            }
        }
    }
}

impl Default for SportFilter {
    fn default() -> Self {
        SportFilter::All
    }
}

/// Canonical activity record
///
/// Produced by the normalization layer from the loosely-typed API export.
/// Immutable once built; every aggregation is a pure function over a slice
/// of these. Only the calendar date is mandatory — everything else degrades
/// to `None` rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Identifier supplied by the source system, if any
    pub id: Option<String>,

    /// Raw sport string as reported by the source (free-form)
    pub sport: Option<String>,

    /// Local calendar date the session started
    pub date: NaiveDate,

    /// Distance covered in kilometers
    pub distance_km: Option<Decimal>,

    /// Average pace in minutes per kilometer
    pub avg_pace: Option<Decimal>,

    /// Session duration in minutes
    pub duration_min: Option<Decimal>,

    /// Average heart rate in beats per minute
    pub avg_hr: Option<Decimal>,

    /// Maximum heart rate in beats per minute
    pub max_hr: Option<Decimal>,
}

impl Activity {
    /// Derived sport category (`Other` when no sport string is present)
    pub fn sport_class(&self) -> SportClass {
        self.sport
            .as_deref()
            .map(SportClass::classify)
            .unwrap_or(SportClass::Other)
    }

    /// True for gym/strength/weight sessions, which never contribute to
    /// distance-based aggregation
    pub fn is_strength_training(&self) -> bool {
        self.sport_class() == SportClass::StrengthTraining
    }

    /// Distance when present and positive
    pub fn resolved_distance(&self) -> Option<Decimal> {
        self.distance_km.filter(|d| *d > Decimal::ZERO)
    }

    /// Resolve the record's pace in min/km.
    ///
    /// Prefers the explicit average pace; falls back to
    /// `duration_min / distance_km`. Only a positive result counts.
    pub fn resolved_pace(&self) -> Option<Decimal> {
        if let Some(pace) = self.avg_pace.filter(|p| *p > Decimal::ZERO) {
            return Some(pace);
        }

        let distance = self.resolved_distance()?;
        let duration = self.duration_min.filter(|d| *d > Decimal::ZERO)?;
        let pace = duration / distance;
        (pace > Decimal::ZERO).then_some(pace)
    }

    /// Speed in km/h derived from the resolved pace
    pub fn resolved_speed(&self) -> Option<Decimal> {
        self.resolved_pace().map(|pace| Decimal::from(60) / pace)
    }

    /// Whether this record qualifies for distance aggregation under the
    /// given filter: positive distance, not strength training, filter match
    pub fn qualifies(&self, filter: &SportFilter) -> bool {
        self.resolved_distance().is_some()
            && !self.is_strength_training()
            && filter.matches(self.sport.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_activity() -> Activity {
        Activity {
            id: Some("a1".to_string()),
            sport: Some("Running".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            distance_km: Some(dec!(10.0)),
            avg_pace: None,
            duration_min: None,
            avg_hr: None,
            max_hr: None,
        }
    }

    #[test]
    fn test_sport_classification() {
        assert_eq!(SportClass::classify("Running"), SportClass::Running);
        assert_eq!(SportClass::classify("trail running"), SportClass::Running);
        assert_eq!(SportClass::classify("WALKING"), SportClass::Walking);
        assert_eq!(SportClass::classify("Hiking"), SportClass::Walking);
        assert_eq!(SportClass::classify("road cycling"), SportClass::Cycling);
        assert_eq!(SportClass::classify("Swim"), SportClass::Swimming);
        assert_eq!(SportClass::classify("Gym"), SportClass::StrengthTraining);
        assert_eq!(
            SportClass::classify("Strength Training"),
            SportClass::StrengthTraining
        );
        assert_eq!(
            SportClass::classify("weight lifting"),
            SportClass::StrengthTraining
        );
        assert_eq!(SportClass::classify("yoga"), SportClass::Other);
    }

    #[test]
    fn test_strength_beats_other_keywords() {
        // "gym run club" is still a gym session for exclusion purposes
        assert_eq!(
            SportClass::classify("gym run club"),
            SportClass::StrengthTraining
        );
    }

    #[test]
    fn test_sport_filter() {
        assert_eq!(SportFilter::from_arg(None), SportFilter::All);
        assert_eq!(SportFilter::from_arg(Some("All")), SportFilter::All);
        assert_eq!(
            SportFilter::from_arg(Some("running")),
            SportFilter::Only("running".to_string())
        );

        let filter = SportFilter::Only("running".to_string());
        assert!(filter.matches(Some("Running")));
        assert!(!filter.matches(Some("trail running")));
        assert!(!filter.matches(None));
        assert!(SportFilter::All.matches(None));
    }

    #[test]
    fn test_explicit_pace_preferred() {
        let mut activity = base_activity();
        activity.avg_pace = Some(dec!(5.5));
        activity.duration_min = Some(dec!(60));

        assert_eq!(activity.resolved_pace(), Some(dec!(5.5)));
    }

    #[test]
    fn test_pace_derived_from_duration() {
        let mut activity = base_activity();
        activity.duration_min = Some(dec!(55));

        assert_eq!(activity.resolved_pace(), Some(dec!(5.5)));
        // 60 / 5.5 km/h
        let speed = activity.resolved_speed().unwrap();
        assert!(speed > dec!(10.9) && speed < dec!(10.91));
    }

    #[test]
    fn test_pace_unresolvable_without_duration() {
        let activity = base_activity();
        assert_eq!(activity.resolved_pace(), None);
        assert_eq!(activity.resolved_speed(), None);
    }

    #[test]
    fn test_nonpositive_pace_falls_through() {
        let mut activity = base_activity();
        activity.avg_pace = Some(dec!(0));
        activity.duration_min = Some(dec!(50));

        // Zero explicit pace is unusable; the derived pace takes over
        assert_eq!(activity.resolved_pace(), Some(dec!(5)));
    }

    #[test]
    fn test_qualification_rules() {
        let activity = base_activity();
        assert!(activity.qualifies(&SportFilter::All));
        assert!(activity.qualifies(&SportFilter::Only("running".to_string())));
        assert!(!activity.qualifies(&SportFilter::Only("cycling".to_string())));

        let mut no_distance = base_activity();
        no_distance.distance_km = None;
        assert!(!no_distance.qualifies(&SportFilter::All));

        let mut negative = base_activity();
        negative.distance_km = Some(dec!(-2));
        assert!(!negative.qualifies(&SportFilter::All));

        let mut gym = base_activity();
        gym.sport = Some("gym session".to_string());
        assert!(!gym.qualifies(&SportFilter::All));
        // The strength exclusion holds even when the filter names the sport
        assert!(!gym.qualifies(&SportFilter::Only("gym session".to_string())));
    }
}
