use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A play event in the shape stored in the destination table.
///
/// Only `reference_id` is guaranteed; every other column is nullable because the
/// source omits fields depending on media type and client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackRecord {
    pub reference_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>, // Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl PlaybackRecord {
    /// Record carrying only its key; the remaining columns start out null.
    pub fn new(reference_id: i64) -> Self {
        Self {
            reference_id,
            watched_at: None,
            friendly_name: None,
            full_title: None,
            media_type: None,
            duration: None,
            ip_address: None,
            platform: None,
        }
    }
}
