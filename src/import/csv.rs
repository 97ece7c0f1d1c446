use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::import::ImportFormat;
use crate::models::Activity;
use crate::normalize::{normalize_all, RawActivity};

/// CSV importer with flexible column mapping
///
/// Headers are lowercased with spaces and dashes folded to underscores,
/// then mapped onto the canonical activity fields. Unknown columns are
/// ignored; unreadable rows are skipped with a warning.
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(&mut column_mapping, "id", &["id", "activity_id"]);
        Self::add_mapping(
            &mut column_mapping,
            "sport",
            &["sport", "sport_type", "activity_type", "type"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "start_time",
            &["start_time", "start_date", "timestamp", "date", "start"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "distance_km",
            &["distance_km", "distance", "dist", "total_distance"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "avg_pace",
            &["avg_pace", "average_pace", "pace", "pace_min_km"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "duration_min",
            &["duration_min", "duration_minutes", "duration"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "duration_sec",
            &["duration_sec", "duration_seconds", "elapsed_time", "moving_time"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "avg_hr",
            &["avg_hr", "avg_heart_rate", "average_hr", "heart_rate", "hr"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "max_hr",
            &["max_hr", "max_heart_rate"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_string(), standard.to_string());
        }
    }

    /// Canonical field name for a raw header, None for unknown columns
    fn normalize_column_name(&self, name: &str) -> Option<String> {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        self.column_mapping.get(&normalized).cloned()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>> {
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(file_path)
            .with_context(|| format!("Failed to open {}", file_path.display()))?;

        let headers: Vec<Option<String>> = reader
            .headers()
            .with_context(|| "Failed to read CSV headers")?
            .iter()
            .map(|h| self.normalize_column_name(h))
            .collect();

        let mut raws = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!(row, error = %e, "Skipping unreadable row");
                    continue;
                }
            };

            let mut object = Map::new();
            for (field, header) in record.iter().zip(&headers) {
                if let Some(name) = header {
                    if !field.is_empty() {
                        object.insert(name.clone(), Value::String(field.to_string()));
                    }
                }
            }

            match serde_json::from_value::<RawActivity>(Value::Object(object)) {
                Ok(raw) => raws.push(raw),
                Err(e) => warn!(row, error = %e, "Skipping malformed row"),
            }
        }

        Ok(normalize_all(&raws))
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn import(content: &str) -> Result<Vec<Activity>> {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        CsvImporter::new().import_file(file.path())
    }

    #[test]
    fn test_basic_import() {
        let activities = import(
            "date,sport,distance_km,avg_pace\n\
             2024-03-01,Running,10.5,5:30\n\
             2024-03-02,Cycling,42.0,\n",
        )
        .unwrap();

        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].distance_km, Some(dec!(10.5)));
        assert_eq!(activities[0].avg_pace, Some(dec!(5.5)));
        assert_eq!(activities[1].avg_pace, None);
    }

    #[test]
    fn test_header_variations() {
        let activities = import(
            "Start Time,Activity Type,Total Distance,Heart Rate\n\
             2024-03-01 07:30:00,Run,8.2,148\n",
        )
        .unwrap();

        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].sport.as_deref(), Some("Run"));
        assert_eq!(activities[0].distance_km, Some(dec!(8.2)));
        assert_eq!(activities[0].avg_hr, Some(dec!(148)));
    }

    #[test]
    fn test_unknown_columns_ignored() {
        let activities = import(
            "date,distance_km,shoe_model\n\
             2024-03-01,5.0,Pegasus\n",
        )
        .unwrap();

        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].distance_km, Some(dec!(5)));
    }

    #[test]
    fn test_dateless_rows_dropped() {
        let activities = import(
            "date,distance_km\n\
             ,5.0\n\
             2024-03-02,7.0\n",
        )
        .unwrap();

        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].distance_km, Some(dec!(7)));
    }

    #[test]
    fn test_duration_seconds_fallback() {
        let activities = import(
            "date,distance_km,duration_seconds\n\
             2024-03-01,10.0,3600\n",
        )
        .unwrap();

        // 60 minutes over 10 km resolves to a 6 min/km pace
        assert_eq!(activities[0].resolved_pace(), Some(dec!(6)));
    }
}
