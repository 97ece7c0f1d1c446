use chrono::NaiveDate;
use fitdash::{correlate, normalize};
use rust_decimal_macros::dec;

/// Integration tests that exercise the complete analysis pipeline

#[cfg(test)]
mod integration_tests {
    use super::*;
    use fitdash::buckets::{AssignmentMode, BucketSet, DistanceBucketMatcher};
    use fitdash::config::AppConfig;
    use fitdash::daily::DayAggregator;
    use fitdash::export::{DateRange, ReportBuilder};
    use fitdash::histogram::{HistogramBinner, HistogramConfig, HistogramSample};
    use fitdash::import::ImportManager;
    use fitdash::load::{RiskZone, TrainingLoadCalculator};
    use fitdash::models::{Activity, SportFilter};
    use fitdash::normalize::RawActivity;
    use fitdash::rolling::RollingStatsEngine;
    use rust_decimal::Decimal;
    use std::io::Write;

    fn raw_record(json: serde_json::Value) -> RawActivity {
        serde_json::from_value(json).unwrap()
    }

    /// Two weeks of running, one strength session and one record without
    /// a distance. Distances cycle 5 / 8 / 10 km.
    fn two_weeks_of_running() -> Vec<Activity> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let mut raw: Vec<RawActivity> = (0..14)
            .map(|i| {
                let distance = match i % 3 {
                    0 => "5",
                    1 => "8",
                    _ => "10",
                };
                raw_record(serde_json::json!({
                    "id": format!("a{}", i),
                    "sport": "running",
                    "start_time": (start + chrono::Duration::days(i)).format("%Y-%m-%d").to_string(),
                    "distance_km": distance,
                    "avg_pace": "5:30",
                }))
            })
            .collect();

        raw.push(raw_record(serde_json::json!({
            "id": "gym",
            "sport": "strength training",
            "start_time": "2024-03-05",
            "distance_km": "1",
        })));
        raw.push(raw_record(serde_json::json!({
            "id": "no-distance",
            "sport": "running",
            "start_time": "2024-03-06",
        })));

        normalize::normalize_all(&raw)
    }

    /// Test the complete workflow from raw records to every dashboard panel
    #[test]
    fn test_complete_dashboard_workflow() {
        let activities = two_weeks_of_running();
        // 14 runs + strength + distance-less record all normalized
        assert_eq!(activities.len(), 16);

        let days = DayAggregator::aggregate(&activities, &SportFilter::All);
        // strength and distance-less records never reach a day total
        assert_eq!(days.len(), 14);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(days[0].distance_km, dec!(5));
        assert_eq!(days[0].avg_pace, Some(dec!(5.5)));

        // histogram covers every day exactly once
        let samples: Vec<HistogramSample> = days.iter().map(HistogramSample::from).collect();
        let bins = HistogramBinner::new(HistogramConfig::default())
            .unwrap()
            .bin(&samples);
        let total: usize = bins.iter().map(|b| b.count).sum();
        assert_eq!(total, days.len());
        let five_k_bin = bins.iter().find(|b| b.label == "4-6 km").unwrap();
        assert_eq!(five_k_bin.count, 5);

        // rolling average shrinks at the start and stays positive
        let distances: Vec<Option<Decimal>> =
            days.iter().map(|d| Some(d.distance_km)).collect();
        let rolling = RollingStatsEngine::rolling_average(&distances, 7).unwrap();
        assert_eq!(rolling.len(), 14);
        assert_eq!(rolling[0], dec!(5));

        // training load: last acute window is days 8..14
        let points = TrainingLoadCalculator::new().calculate_series(&days).unwrap();
        assert_eq!(points.len(), 14);
        let latest = points.last().unwrap();
        assert_eq!(latest.acute, dec!(54));
        assert_eq!(latest.chronic_weekly, dec!(26.25));
        let ratio = latest.ratio.unwrap();
        assert!(ratio > dec!(2));
        assert_eq!(RiskZone::from_ratio(ratio), RiskZone::VeryHigh);

        // buckets: 5 km runs land in 5K, 10 km runs in 10K, 8 km unmatched
        let stats = DistanceBucketMatcher::new(
            BucketSet::standard_road_distances(),
            AssignmentMode::Nearest,
        )
        .match_activities(&activities, &SportFilter::All);
        assert_eq!(stats[0].label, "5K");
        assert_eq!(stats[0].count, 5);
        assert_eq!(stats[1].label, "10K");
        assert_eq!(stats[1].count, 4);
        assert_eq!(stats[2].count + stats[3].count, 0);

        // two full weeks give all three weekday metrics
        let profile = correlate::weekday_profile(&days);
        let matrix = correlate::CorrelationEngine::matrix(&profile).unwrap();
        assert_eq!(matrix.metrics.len(), 3);
        assert_eq!(matrix.get("distance", "distance"), Some(Decimal::ONE));
    }

    /// Test that the sport filter drops other sports before aggregation
    #[test]
    fn test_sport_filter_flows_through() {
        let raw = vec![
            raw_record(serde_json::json!({
                "sport": "running",
                "start_time": "2024-05-01",
                "distance_km": "10",
            })),
            raw_record(serde_json::json!({
                "sport": "cycling",
                "start_time": "2024-05-01",
                "distance_km": "40",
            })),
        ];
        let activities = normalize::normalize_all(&raw);

        let all = DayAggregator::aggregate(&activities, &SportFilter::All);
        assert_eq!(all[0].distance_km, dec!(50));
        assert_eq!(all[0].activity_count, 2);

        let running_only =
            DayAggregator::aggregate(&activities, &SportFilter::Only("running".to_string()));
        assert_eq!(running_only[0].distance_km, dec!(10));
        assert_eq!(running_only[0].activity_count, 1);
    }

    /// Test importing a directory of mixed-format files into a report
    #[test]
    fn test_import_directory_to_report() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("april.json");
        std::fs::write(
            &json_path,
            serde_json::json!([
                {"activityId": "j1", "type": "running", "startTime": "2024-04-01", "distanceKm": "5.2", "avgPace": "5:20"},
                {"activityId": "j2", "type": "running", "startTime": "2024-04-02", "distanceKm": "10.4"}
            ])
            .to_string(),
        )
        .unwrap();

        let csv_path = dir.path().join("may.csv");
        let mut csv_file = std::fs::File::create(&csv_path).unwrap();
        writeln!(csv_file, "date,sport,distance_km,avg_pace").unwrap();
        writeln!(csv_file, "2024-05-01,running,21.3,5:45").unwrap();
        drop(csv_file);

        let manager = ImportManager::new();
        let activities = manager.import_path(dir.path()).unwrap();
        assert_eq!(activities.len(), 3);

        let report = ReportBuilder::new(AppConfig::default())
            .build(&activities, &DateRange::new(None, None))
            .unwrap();
        assert_eq!(report.days.len(), 3);

        // 5.2 km and 10.4 km fall into the 5K and 10K buckets, 21.3 km
        // into the half marathon bucket
        let counts: Vec<usize> = report.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 0]);
    }

    /// Test that a date range narrows the report input
    #[test]
    fn test_date_range_narrows_report() {
        let activities = two_weeks_of_running();
        let range = DateRange::new(
            Some(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()),
            Some(NaiveDate::from_ymd_opt(2024, 3, 17).unwrap()),
        );

        let report = ReportBuilder::new(AppConfig::default())
            .build(&activities, &range)
            .unwrap();
        assert_eq!(report.days.len(), 7);
        assert_eq!(
            report.days[0].date,
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
    }

    /// Test that repeating an analysis over the same input changes nothing
    #[test]
    fn test_pipeline_is_idempotent() {
        let activities = two_weeks_of_running();

        let first = DayAggregator::aggregate(&activities, &SportFilter::All);
        let second = DayAggregator::aggregate(&activities, &SportFilter::All);
        assert_eq!(first, second);

        let calculator = TrainingLoadCalculator::new();
        assert_eq!(
            calculator.calculate_series(&first).unwrap(),
            calculator.calculate_series(&second).unwrap()
        );
    }

    /// Test that empty input flows through every stage without errors
    #[test]
    fn test_empty_input_produces_empty_outputs() {
        let days = DayAggregator::aggregate(&[], &SportFilter::All);
        assert!(days.is_empty());

        let bins = HistogramBinner::new(HistogramConfig::default())
            .unwrap()
            .bin(&[]);
        assert!(bins.is_empty());

        let points = TrainingLoadCalculator::new().calculate_series(&days).unwrap();
        assert!(points.is_empty());

        let rolling = RollingStatsEngine::rolling_average(&[], 7).unwrap();
        assert!(rolling.is_empty());
        assert!(RollingStatsEngine::linear_trend(&[]).is_none());

        let profile = correlate::weekday_profile(&days);
        assert!(correlate::CorrelationEngine::matrix(&profile).is_none());
    }

    /// Test that out-of-order same-day records are summed, not duplicated
    #[test]
    fn test_out_of_order_input_is_sorted_and_merged() {
        let raw = vec![
            raw_record(serde_json::json!({
                "sport": "running",
                "start_time": "2024-05-03",
                "distance_km": "7",
            })),
            raw_record(serde_json::json!({
                "sport": "running",
                "start_time": "2024-05-01",
                "distance_km": "5",
            })),
            raw_record(serde_json::json!({
                "sport": "running",
                "start_time": "2024-05-01",
                "distance_km": "3",
            })),
        ];
        let activities = normalize::normalize_all(&raw);
        let days = DayAggregator::aggregate(&activities, &SportFilter::All);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(days[0].distance_km, dec!(8));
        assert_eq!(days[0].activity_count, 2);
        assert_eq!(days[1].distance_km, dec!(7));
    }
}
