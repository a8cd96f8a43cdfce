//! Destination storage for normalized playback history.
//!
//! A [`StoreConnector`] hands out one [`HistoryWriter`] per sync cycle; the
//! writer owns a single connection that is closed when the cycle ends, so an
//! outage in one cycle never leaves a broken handle behind for the next.

pub mod postgres;

use async_trait::async_trait;
use history_sync_models::PlaybackRecord;
use std::time::Duration;
use thiserror::Error;

pub use postgres::{PgHistoryWriter, PgStoreConnector};

/// The destination store could not be reached or rejected a statement
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to store: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("timed out connecting to store after {0:?}")]
    ConnectTimeout(Duration),

    #[error("failed to ensure schema: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("failed to write history: {0}")]
    Write(#[source] sqlx::Error),
}

#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Human-readable target with credentials removed
    fn describe(&self) -> String;

    async fn connect(&self) -> Result<Box<dyn HistoryWriter>, StoreError>;
}

#[async_trait]
pub trait HistoryWriter: Send {
    /// Create the destination table if it does not exist. Committed on return.
    async fn ensure_schema(&mut self) -> Result<(), StoreError>;

    /// Insert `records`, skipping keys that already exist, as one transaction.
    /// Returns the number of rows actually inserted.
    async fn insert_new(&mut self, records: &[PlaybackRecord]) -> Result<u64, StoreError>;

    async fn close(self: Box<Self>) -> Result<(), StoreError>;
}

/// Ensure the schema exists, then insert every record whose key is not yet stored.
///
/// Returns the count of newly inserted rows; existing keys are silent no-ops.
pub async fn upsert_history(
    writer: &mut dyn HistoryWriter,
    records: &[PlaybackRecord],
) -> Result<u64, StoreError> {
    writer.ensure_schema().await?;
    if records.is_empty() {
        return Ok(0);
    }
    writer.insert_new(records).await
}
