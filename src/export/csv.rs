use super::ExportError;
use crate::buckets::BucketStats;
use crate::daily::DayAggregate;
use crate::load::TrainingLoadPoint;
use std::io::Write;
use std::path::Path;

/// Export day aggregates to CSV format
pub fn export_day_series<P: AsRef<Path>>(
    days: &[DayAggregate],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(file, "Date,Distance_KM,Avg_Pace,Avg_Speed,Activity_Count")?;

    for day in days {
        writeln!(
            file,
            "{},{},{},{},{}",
            day.date.format("%Y-%m-%d"),
            day.distance_km,
            day.avg_pace.map_or("".to_string(), |v| v.to_string()),
            day.avg_speed.map_or("".to_string(), |v| v.to_string()),
            day.activity_count
        )?;
    }

    Ok(())
}

/// Export training load series to CSV format (suitable for spreadsheet plotting)
pub fn export_load_series<P: AsRef<Path>>(
    points: &[TrainingLoadPoint],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "Date,Acute,Chronic,Chronic_Weekly,Ratio,Monotony,Strain"
    )?;

    for point in points {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            point.date.format("%Y-%m-%d"),
            point.acute,
            point.chronic,
            point.chronic_weekly,
            point.ratio.map_or("".to_string(), |v| v.to_string()),
            point.monotony.map_or("".to_string(), |v| v.to_string()),
            point.strain.map_or("".to_string(), |v| v.to_string())
        )?;
    }

    Ok(())
}

/// Export per-bucket statistics to CSV format
pub fn export_bucket_stats<P: AsRef<Path>>(
    stats: &[BucketStats],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "Bucket,Center_KM,Count,Mean_Pace,Median_Pace,Mean_Distance_KM"
    )?;

    for bucket in stats {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            bucket.label,
            bucket.center,
            bucket.count,
            bucket.mean_pace.map_or("".to_string(), |v| v.to_string()),
            bucket.median_pace.map_or("".to_string(), |v| v.to_string()),
            bucket.mean_distance.map_or("".to_string(), |v| v.to_string())
        )?;
    }

    Ok(())
}
