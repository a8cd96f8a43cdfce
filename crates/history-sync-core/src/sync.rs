use futures::FutureExt;
use history_sync_sources::HistorySource;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};
use crate::error::SyncError;
use crate::normalize::normalize_history;
use crate::store::{upsert_history, StoreConnector};

/// Default number of most recent history rows requested per cycle
pub const DEFAULT_HISTORY_LENGTH: u32 = 1000;

/// Runs extract → normalize → load cycles against one source and one store
pub struct SyncOrchestrator {
    source: Box<dyn HistorySource>,
    store: Box<dyn StoreConnector>,
    history_length: u32,
}

/// Outcome of one cycle. Counts reflect how far the cycle got before any failure.
#[derive(Debug)]
pub struct SyncResult {
    pub fetched: usize,
    pub dropped: usize,
    pub inserted: u64,
    pub duration: Duration,
    pub error: Option<SyncError>,
}

impl SyncResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Default)]
struct CycleProgress {
    fetched: usize,
    dropped: usize,
    inserted: u64,
}

impl SyncOrchestrator {
    pub fn new(source: Box<dyn HistorySource>, store: Box<dyn StoreConnector>) -> Self {
        Self {
            source,
            store,
            history_length: DEFAULT_HISTORY_LENGTH,
        }
    }

    pub fn with_history_length(mut self, history_length: u32) -> Self {
        self.history_length = history_length;
        self
    }

    /// Run one cycle. Never fails: fetch, storage and unexpected failures
    /// (including panics) are logged and reported in [`SyncResult::error`].
    #[instrument(skip(self), fields(source = self.source.source_name()))]
    pub async fn sync(&self) -> SyncResult {
        let start = Instant::now();
        info!(
            operation = "sync_cycle_start",
            history_length = self.history_length,
            store = %self.store.describe(),
            "Starting history sync"
        );

        let mut progress = CycleProgress::default();
        let outcome = AssertUnwindSafe(self.run_cycle(&mut progress))
            .catch_unwind()
            .await;
        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(panic) => Some(SyncError::from_panic(panic)),
        };

        let result = SyncResult {
            fetched: progress.fetched,
            dropped: progress.dropped,
            inserted: progress.inserted,
            duration: start.elapsed(),
            error,
        };

        match &result.error {
            None => info!(
                operation = "sync_cycle_complete",
                fetched = result.fetched,
                dropped = result.dropped,
                inserted = result.inserted,
                duration_ms = result.duration.as_millis(),
                "History sync finished"
            ),
            Some(e) => error!(
                operation = "sync_cycle_error",
                kind = e.kind(),
                fetched = result.fetched,
                error = %e,
                "History sync failed"
            ),
        }

        result
    }

    async fn run_cycle(&self, progress: &mut CycleProgress) -> Result<(), SyncError> {
        let raw = self.source.fetch_recent(self.history_length).await?;
        progress.fetched = raw.len();

        if raw.is_empty() {
            warn!(operation = "sync_fetch_empty", "No history returned by source");
            return Ok(());
        }
        info!(operation = "sync_fetched", fetched = raw.len(), "Fetched history records");

        let batch = normalize_history(&raw);
        progress.dropped = batch.rejected.len();
        for rejection in &batch.rejected {
            warn!(
                operation = "sync_record_dropped",
                index = rejection.index,
                issue = %rejection.issue,
                "Dropping history record"
            );
        }
        info!(
            operation = "sync_normalized",
            records = batch.records.len(),
            dropped = batch.rejected.len(),
            "Processing records for database insertion"
        );

        let mut writer = self.store.connect().await?;
        progress.inserted = upsert_history(writer.as_mut(), &batch.records).await?;
        if let Err(e) = writer.close().await {
            warn!(error = %e, "Failed to close store connection cleanly");
        }

        info!(
            operation = "sync_loaded",
            inserted = progress.inserted,
            "Inserted new history records"
        );
        Ok(())
    }
}
