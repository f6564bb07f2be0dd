use crate::{Record, StoreError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory record store
///
/// Maps record ID to committed record. Cloning shares the same underlying map.
/// Only the batch applier writes to it; everything else goes through the
/// read accessors, which take the read lock and therefore never see a batch
/// half-applied.
#[derive(Clone, Default)]
pub struct RecordStore {
    records: Arc<RwLock<HashMap<u64, Record>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Write every record of a batch under a single write lock
    ///
    /// The batch is checked before anything is inserted: an ID that is already
    /// committed, or repeated within the batch, rejects the whole batch.
    pub(crate) async fn commit_batch(&self, batch: &[Record]) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        let mut seen = HashSet::with_capacity(batch.len());
        for record in batch {
            if records.contains_key(&record.id) {
                return Err(StoreError::AlreadyCommitted(record.id));
            }
            if !seen.insert(record.id) {
                return Err(StoreError::DuplicateInBatch(record.id));
            }
        }

        records.extend(batch.iter().map(|r| (r.id, r.clone())));
        Ok(())
    }

    pub async fn get(&self, id: u64) -> Option<Record> {
        let records = self.records.read().await;
        records.get(&id).cloned()
    }

    /// Snapshot of every committed record, ordered by ID
    pub async fn list_all(&self) -> Vec<Record> {
        let records = self.records.read().await;
        let mut all: Vec<Record> = records.values().cloned().collect();
        all.sort_by_key(|r| r.id);
        all
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
