//! Field names shared by the source payload and the destination table.

/// Stable per-play identifier assigned by Tautulli; the destination primary key.
pub const KEY_FIELD: &str = "reference_id";

/// Unix seconds of the play in the source payload.
pub const SOURCE_DATE_FIELD: &str = "date";

/// Source fields kept during normalization. Everything else in a raw record is ignored.
pub const HISTORY_FIELDS: [&str; 8] = [
    KEY_FIELD,
    SOURCE_DATE_FIELD,
    "friendly_name",
    "full_title",
    "media_type",
    "duration",
    "ip_address",
    "platform",
];
