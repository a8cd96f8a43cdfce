use async_trait::async_trait;
use history_sync_models::RawHistoryRecord;
use crate::SourceError;

/// A remote system that can report its most recent playback history.
///
/// The source exposes no cursor, so every call returns the newest `limit` rows
/// and consecutive calls overlap. Callers deduplicate on the record key.
#[async_trait]
pub trait HistorySource: Send + Sync {
    fn source_name(&self) -> &str;

    async fn fetch_recent(&self, limit: u32) -> Result<Vec<RawHistoryRecord>, SourceError>;
}
