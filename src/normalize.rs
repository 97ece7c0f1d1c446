//! Normalization of loosely-typed activity exports
//!
//! The dashboard API reports activities as JSON objects with inconsistent
//! field naming (`avg_hr` / `avgHR` / `avg_heart_rate`), values that may be
//! numbers or strings, paces as either decimal minutes or `"MM:SS"`, and a
//! handful of datetime formats. This module resolves all of that into the
//! canonical [`Activity`] record so the aggregation code never has to look
//! at raw shapes. Malformed fields degrade to `None`; only a record with no
//! resolvable date is dropped (with a warning), never the whole batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::Activity;

/// Datetime formats accepted for `start_time` strings
const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// A scalar that may arrive as integer, float, or string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    /// Interpret as a plain decimal number.
    ///
    /// Non-finite floats and unparseable strings come back as `None`
    /// (treated as absent, per the input contract).
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            RawValue::Int(i) => Some(Decimal::from(*i)),
            RawValue::Float(f) => Decimal::from_f64(*f),
            RawValue::Text(s) => s.trim().parse::<Decimal>().ok(),
        }
    }

    /// Interpret as a pace: decimal minutes or an `"MM:SS"` string
    pub fn as_pace(&self) -> Option<Decimal> {
        match self {
            RawValue::Text(s) if s.contains(':') => parse_pace_mm_ss(s),
            other => other.as_decimal(),
        }
    }

    /// Interpret as a calendar date: datetime string, date string, or
    /// epoch seconds
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RawValue::Int(ts) => DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()),
            RawValue::Float(ts) => {
                DateTime::from_timestamp(*ts as i64, 0).map(|dt| dt.date_naive())
            }
            RawValue::Text(s) => parse_date(s.trim()),
        }
    }
}

/// Parse an `"MM:SS"` pace string into decimal minutes
fn parse_pace_mm_ss(s: &str) -> Option<Decimal> {
    let (minutes, seconds) = s.trim().split_once(':')?;
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    Some(Decimal::from(minutes) + Decimal::from(seconds) / Decimal::from(60))
}

/// Parse a datetime or date string and take its calendar date
fn parse_date(s: &str) -> Option<NaiveDate> {
    for format in &DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Activity record as shipped by the API, before normalization
///
/// Every field is optional and every known alias is accepted. Unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawActivity {
    #[serde(default, alias = "activity_id", alias = "activityId")]
    pub id: Option<String>,

    #[serde(
        default,
        alias = "sport_type",
        alias = "activity_type",
        alias = "type"
    )]
    pub sport: Option<String>,

    #[serde(
        default,
        alias = "startTime",
        alias = "start_date",
        alias = "timestamp",
        alias = "date"
    )]
    pub start_time: Option<RawValue>,

    #[serde(default, alias = "distance", alias = "distanceKm")]
    pub distance_km: Option<RawValue>,

    #[serde(default, alias = "avgPace", alias = "average_pace", alias = "pace")]
    pub avg_pace: Option<RawValue>,

    #[serde(
        default,
        alias = "avgHR",
        alias = "avg_heart_rate",
        alias = "average_hr"
    )]
    pub avg_hr: Option<RawValue>,

    #[serde(default, alias = "maxHR", alias = "max_heart_rate")]
    pub max_hr: Option<RawValue>,

    #[serde(default, alias = "duration_minutes", alias = "durationMin")]
    pub duration_min: Option<RawValue>,

    #[serde(default, alias = "duration_seconds", alias = "durationSec")]
    pub duration_sec: Option<RawValue>,
}

/// Normalize a single raw record into the canonical form.
///
/// Returns `None` when no calendar date can be resolved — the date is the
/// identity every aggregation keys on.
pub fn normalize(raw: &RawActivity) -> Option<Activity> {
    let date = raw.start_time.as_ref().and_then(RawValue::as_date)?;

    let duration_min = raw
        .duration_min
        .as_ref()
        .and_then(RawValue::as_decimal)
        .or_else(|| {
            raw.duration_sec
                .as_ref()
                .and_then(RawValue::as_decimal)
                .map(|secs| secs / Decimal::from(60))
        });

    Some(Activity {
        id: raw.id.clone(),
        sport: raw.sport.clone(),
        date,
        distance_km: raw.distance_km.as_ref().and_then(RawValue::as_decimal),
        avg_pace: raw.avg_pace.as_ref().and_then(RawValue::as_pace),
        duration_min,
        avg_hr: raw.avg_hr.as_ref().and_then(RawValue::as_decimal),
        max_hr: raw.max_hr.as_ref().and_then(RawValue::as_decimal),
    })
}

/// Normalize a batch, skipping undateable records with a warning
pub fn normalize_all(raw: &[RawActivity]) -> Vec<Activity> {
    let mut activities = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;

    for record in raw {
        match normalize(record) {
            Some(activity) => activities.push(activity),
            None => {
                skipped += 1;
                debug!(id = ?record.id, "skipping record with unresolvable date");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = activities.len(), "dropped undateable records");
    }

    activities
}
