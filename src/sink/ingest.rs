//! Ingest Module
//!
//! `RecordSink` ties the components together:
//! 1. `Validator` rejects malformed payloads before an ID is spent
//! 2. `SequenceAllocator` assigns the record ID
//! 3. `Correlator` registers the caller's waiter
//! 4. `BatchWindow` receives the record
//! 5. The caller waits on its own `PendingRequest`

use crate::{
    batch::{BatchOrchestrator, BatchWindow},
    config::Config,
    correlation::Correlator,
    sequence::SequenceAllocator,
    state::RecordStore,
    validation::Validator,
    NewRecord, Record, SinkError,
};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Batched, correlated record ingestion
pub struct RecordSink {
    validator: Validator,
    sequence: SequenceAllocator,
    correlator: Correlator,
    window: BatchWindow,
    store: RecordStore,
    await_timeout: Option<Duration>,
    /// Taken on shutdown
    orchestrator: Mutex<Option<BatchOrchestrator>>,
}

impl RecordSink {
    /// Creates a sink and starts its batch pipeline
    ///
    /// Must be called from within a Tokio runtime, since the window and
    /// applier tasks are spawned immediately.
    pub fn new(config: &Config) -> Self {
        let store = RecordStore::new();
        let correlator = Correlator::new();
        let orchestrator =
            BatchOrchestrator::spawn(config.batch.clone(), store.clone(), correlator.clone());

        Self {
            validator: Validator::new(&config.validation),
            sequence: SequenceAllocator::new(),
            correlator,
            window: orchestrator.window().clone(),
            store,
            await_timeout: config.correlation.await_timeout(),
            orchestrator: Mutex::new(Some(orchestrator)),
        }
    }

    /// Submit a record and wait until the batch containing it is committed
    ///
    /// Only the calling task is suspended; other submitters and the pipeline
    /// keep running.
    ///
    /// # Returns
    /// * `Ok(Record)` with the assigned ID once it is visible in the store
    /// * `Err(SinkError)` on validation failure, timeout, shutdown or a rejected batch
    pub async fn submit(&self, record: NewRecord) -> Result<Record, SinkError> {
        self.validator.validate(&record)?;

        let id = self.sequence.next();
        let pending = self.correlator.register(id)?;

        // On failure `pending` is dropped here, which unregisters it
        self.window.push(Record {
            id,
            name: record.name,
        })?;
        debug!("Record {} queued", id);

        let result = pending.wait(self.await_timeout).await;
        if let Err(e) = &result {
            warn!("Record {} failed: {}", id, e);
        }
        result
    }

    /// Snapshot of every committed record, ordered by ID
    pub async fn list_all(&self) -> Vec<Record> {
        self.store.list_all().await
    }

    pub async fn get(&self, id: u64) -> Option<Record> {
        self.store.get(id).await
    }

    /// Number of committed records
    pub async fn len(&self) -> usize {
        self.store.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    /// Number of callers currently waiting for their record
    pub fn outstanding(&self) -> usize {
        self.correlator.outstanding()
    }

    /// Flush the open window, apply it, then fail anything still waiting
    ///
    /// Later submissions fail with `SinkError::Shutdown`. Calling this more
    /// than once is harmless.
    pub async fn shutdown(&self) {
        let orchestrator = self.orchestrator.lock().await.take();
        if let Some(orchestrator) = orchestrator {
            orchestrator.shutdown().await;
            self.correlator.close();
            info!(
                "Record sink stopped after issuing {} IDs",
                self.sequence.current()
            );
        }
    }
}
