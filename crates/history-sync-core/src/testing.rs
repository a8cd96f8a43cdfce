//! In-memory doubles for the source and the store, used by unit tests.

use async_trait::async_trait;
use history_sync_models::{PlaybackRecord, RawHistoryRecord};
use history_sync_sources::{HistorySource, SourceError};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use crate::store::{HistoryWriter, StoreConnector, StoreError};

pub enum Scripted {
    Records(Vec<RawHistoryRecord>),
    Fail(SourceError),
    Panic,
}

/// Source returning queued responses in order, then empty batches
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Scripted>>,
    pub calls: AtomicUsize,
    pub last_limit: Mutex<Option<u32>>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl HistorySource for ScriptedSource {
    fn source_name(&self) -> &str {
        "scripted"
    }

    async fn fetch_recent(&self, limit: u32) -> Result<Vec<RawHistoryRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_limit.lock().unwrap() = Some(limit);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Records(records)) => Ok(records),
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Panic) => panic!("scripted source panic"),
            None => Ok(Vec::new()),
        }
    }
}

/// Shared state behind [`MemoryStore`], inspected by tests
#[derive(Default)]
pub struct MemoryState {
    pub rows: BTreeMap<i64, PlaybackRecord>,
    pub schema_created: bool,
    pub connects: usize,
    pub insert_calls: usize,
    pub fail_connect: bool,
    pub fail_write: bool,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    pub state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn with_rows(ids: &[i64]) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            for id in ids {
                state.rows.insert(*id, PlaybackRecord::new(*id));
            }
        }
        store
    }

    pub fn row_ids(&self) -> Vec<i64> {
        self.state.lock().unwrap().rows.keys().copied().collect()
    }
}

#[async_trait]
impl StoreConnector for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn connect(&self) -> Result<Box<dyn HistoryWriter>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.connects += 1;
        if state.fail_connect {
            return Err(StoreError::Connect(sqlx::Error::PoolTimedOut));
        }
        Ok(Box::new(MemoryWriter {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemoryWriter {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl HistoryWriter for MemoryWriter {
    async fn ensure_schema(&mut self) -> Result<(), StoreError> {
        self.state.lock().unwrap().schema_created = true;
        Ok(())
    }

    async fn insert_new(&mut self, records: &[PlaybackRecord]) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if state.fail_write {
            return Err(StoreError::Write(sqlx::Error::Protocol(
                "connection reset".to_string(),
            )));
        }
        let mut inserted = 0;
        for record in records {
            if !state.rows.contains_key(&record.reference_id) {
                state.rows.insert(record.reference_id, record.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn close(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
