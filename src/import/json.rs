use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::import::ImportFormat;
use crate::models::Activity;
use crate::normalize::{normalize_all, RawActivity};

/// JSON importer for activity summary exports.
///
/// Accepts either a bare array of activity objects or an object wrapping
/// the array under an `activities` or `data` key. Malformed individual
/// records are skipped with a warning, never a hard failure.
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        JsonImporter
    }

    fn extract_records(value: Value) -> Result<Vec<Value>> {
        match value {
            Value::Array(records) => Ok(records),
            Value::Object(mut map) => {
                for key in ["activities", "data"] {
                    if let Some(Value::Array(records)) = map.remove(key) {
                        return Ok(records);
                    }
                }
                anyhow::bail!("JSON object has no 'activities' or 'data' array");
            }
            _ => anyhow::bail!("Expected a JSON array of activity objects"),
        }
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<Activity>> {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", file_path.display()))?;

        let records = Self::extract_records(value)?;
        let mut raws = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<RawActivity>(record) {
                Ok(raw) => raws.push(raw),
                Err(e) => warn!(index, error = %e, "Skipping malformed record"),
            }
        }

        Ok(normalize_all(&raws))
    }

    fn get_format_name(&self) -> &'static str {
        "JSON"
    }
}

impl Default for JsonImporter {
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
            .suffix(".json")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        JsonImporter::new().import_file(file.path())
    }

    #[test]
    fn test_bare_array_with_aliases() {
        let activities = import(
            r#"[
                {"activityId": "a1", "type": "Run", "startTime": "2024-03-01T07:30:00",
                 "distance": 10.2, "avgHR": 152, "pace": "5:30"},
                {"id": "a2", "sport": "Ride", "date": "2024-03-02", "distance_km": "42.5"}
            ]"#,
        )
        .unwrap();

        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].id.as_deref(), Some("a1"));
        assert_eq!(activities[0].distance_km, Some(dec!(10.2)));
        assert_eq!(activities[0].avg_pace, Some(dec!(5.5)));
        assert_eq!(activities[1].distance_km, Some(dec!(42.5)));
    }

    #[test]
    fn test_wrapped_payload() {
        let activities = import(
            r#"{"activities": [{"date": "2024-03-01", "distance_km": 5}],
                "total": 1}"#,
        )
        .unwrap();

        assert_eq!(activities.len(), 1);
    }

    #[test]
    fn test_malformed_record_skipped() {
        let activities = import(
            r#"[
                {"date": "2024-03-01", "distance_km": 5},
                {"date": "2024-03-02", "distance_km": {"nested": true}},
                {"date": "2024-03-03", "distance_km": 7}
            ]"#,
        )
        .unwrap();

        assert_eq!(activities.len(), 2);
    }

    #[test]
    fn test_dateless_record_dropped() {
        let activities = import(r#"[{"distance_km": 5}]"#).unwrap();
        assert!(activities.is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(import("not json").is_err());
    }

    #[test]
    fn test_scalar_payload_is_an_error() {
        assert!(import("42").is_err());
    }
}
