//! Batch Applier Module
//!
//! Consumes sealed batches in order, writes each one to the store inside a
//! single write-lock critical section, and then hands every committed record
//! to the correlator so its caller wakes up.
//!
//! A rejected batch is rejected as a whole: the same `StoreWrite` error is
//! delivered to every caller in that batch and to nobody else.

use crate::{correlation::Correlator, state::RecordStore, Batch, SinkError};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

pub struct BatchApplier {
    store: RecordStore,
    correlator: Correlator,
}

impl BatchApplier {
    pub fn new(store: RecordStore, correlator: Correlator) -> Self {
        Self { store, correlator }
    }

    /// Apply one batch and notify its callers
    ///
    /// # Returns
    /// * `Ok(n)` with the number of records committed
    /// * `Err(SinkError::StoreWrite)` if the store rejected the batch
    pub async fn apply(&self, batch: Batch) -> Result<usize, SinkError> {
        let batch_id = batch.batch_id;

        if let Err(source) = self.store.commit_batch(&batch.records).await {
            let err = SinkError::StoreWrite { batch_id, source };
            error!("Batch #{} rejected: {}", batch_id, err);
            self.correlator.fail(batch.ids(), err.clone());
            return Err(err);
        }

        let committed = batch.len();
        for record in batch.records {
            self.correlator.complete(record);
        }

        Ok(committed)
    }

    /// Apply batches until the window closes its side of the channel
    pub async fn run(self, mut batches: mpsc::UnboundedReceiver<Batch>) {
        info!("Batch applier started");

        while let Some(batch) = batches.recv().await {
            let batch_id = batch.batch_id;
            let trigger = batch.trigger;
            let sealed_at = batch.sealed_at;

            if let Ok(committed) = self.apply(batch).await {
                let latency_ms = (chrono::Utc::now() - sealed_at).num_milliseconds();
                debug!(batch_id, committed, ?trigger, %sealed_at, latency_ms, "Batch applied");
            }
        }

        info!("Batch applier stopped");
    }
}
