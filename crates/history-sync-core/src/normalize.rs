use chrono::{DateTime, TimeZone, Utc};
use history_sync_models::{PlaybackRecord, RawHistoryRecord, HISTORY_FIELDS, KEY_FIELD, SOURCE_DATE_FIELD};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Why a raw record could not be turned into a [`PlaybackRecord`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataQualityIssue {
    /// `reference_id` absent or null
    MissingKey,
    /// `reference_id` present but not an integer; holds the offending value as JSON
    InvalidKey(String),
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityIssue::MissingKey => write!(f, "missing {}", KEY_FIELD),
            DataQualityIssue::InvalidKey(value) => {
                write!(f, "{} is not an integer: {}", KEY_FIELD, value)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Position of the record in the fetched batch
    pub index: usize,
    pub issue: DataQualityIssue,
}

#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub records: Vec<PlaybackRecord>,
    pub rejected: Vec<Rejection>,
}

/// Normalize a fetched batch. Records with a missing or non-integer key are
/// collected in `rejected` instead of failing the batch.
pub fn normalize_history(raw: &[RawHistoryRecord]) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        records: Vec::with_capacity(raw.len()),
        rejected: Vec::new(),
    };

    for (index, record) in raw.iter().enumerate() {
        match normalize_record(record) {
            Ok(normalized) => batch.records.push(normalized),
            Err(issue) => batch.rejected.push(Rejection { index, issue }),
        }
    }

    batch
}

pub fn normalize_record(raw: &RawHistoryRecord) -> Result<PlaybackRecord, DataQualityIssue> {
    let selected = select_fields(raw);

    let key = selected.get(KEY_FIELD).ok_or(DataQualityIssue::MissingKey)?;
    let reference_id =
        coerce_integer(key).ok_or_else(|| DataQualityIssue::InvalidKey(key.to_string()))?;

    let text = |field: &str| selected.get(field).and_then(|v| coerce_text(v));

    Ok(PlaybackRecord {
        reference_id,
        watched_at: selected
            .get(SOURCE_DATE_FIELD)
            .and_then(|v| coerce_integer(v))
            .and_then(unix_to_datetime),
        friendly_name: text("friendly_name"),
        full_title: text("full_title"),
        media_type: text("media_type"),
        duration: selected
            .get("duration")
            .and_then(|v| coerce_integer(v))
            .and_then(|d| i32::try_from(d).ok()),
        ip_address: text("ip_address"),
        platform: text("platform"),
    })
}

/// Non-null fields of `raw` that are part of the target shape
fn select_fields(raw: &RawHistoryRecord) -> HashMap<&'static str, &Value> {
    HISTORY_FIELDS
        .iter()
        .filter_map(|field| raw.get(field).map(|value| (*field, value)))
        .collect()
}

/// Integers, integral floats and numeric strings; nothing else
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn unix_to_datetime(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}
