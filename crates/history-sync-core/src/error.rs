use crate::store::StoreError;
use history_sync_sources::SourceError;
use std::any::Any;
use thiserror::Error;

/// Failure of one sync cycle, caught at the orchestrator boundary
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] SourceError),

    #[error("storage unavailable: {0}")]
    Storage(#[from] StoreError),

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl SyncError {
    /// Stable category name used in log fields and JSON output
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Fetch(_) => "fetch_failed",
            SyncError::Storage(_) => "storage_unavailable",
            SyncError::Unexpected(_) => "unexpected",
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        SyncError::Unexpected(panic_message(payload.as_ref()))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic with non-string payload".to_string()
    }
}
