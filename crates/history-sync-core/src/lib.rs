pub mod error;
pub mod normalize;
pub mod scheduler;
pub mod store;
pub mod sync;

#[cfg(test)]
mod testing;

pub use error::SyncError;
pub use normalize::{normalize_history, normalize_record, DataQualityIssue, NormalizedBatch, Rejection};
pub use scheduler::{Clock, PollingDriver, SyncJob, TokioClock};
pub use store::{upsert_history, HistoryWriter, PgStoreConnector, StoreConnector, StoreError};
pub use sync::{SyncOrchestrator, SyncResult, DEFAULT_HISTORY_LENGTH};
