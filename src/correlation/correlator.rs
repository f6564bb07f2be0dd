//! Correlator Module
//!
//! Holds one one-shot completion channel per outstanding submission, keyed by
//! record ID. The batch applier resolves entries; callers await them.
//!
//! # Lifecycle of an entry
//! 1. `register(id)` inserts the sender and hands the receiver to the caller
//! 2. Exactly one of `complete`, `fail`, `close`, a timeout, or the caller
//!    dropping its `PendingRequest` removes it

use crate::{Record, SinkError};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

type Outcome = Result<Record, SinkError>;
type Waiters = DashMap<u64, oneshot::Sender<Outcome>>;

/// Indexed waiter table shared by submitters and the batch applier
#[derive(Clone, Default)]
pub struct Correlator {
    waiters: Arc<Waiters>,
    closed: Arc<AtomicBool>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a record ID
    ///
    /// Must be called before the record is pushed into the batch window so the
    /// completion cannot arrive ahead of the waiter.
    ///
    /// # Returns
    /// * `Ok(PendingRequest)` to await the outcome on
    /// * `Err(SinkError::Shutdown)` if the correlator has been closed
    pub fn register(&self, id: u64) -> Result<PendingRequest, SinkError> {
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(id, tx);

        // Checked after the insert: a concurrent close() either sees this entry
        // while draining or we see its flag here.
        if self.closed.load(Ordering::SeqCst) {
            self.waiters.remove(&id);
            return Err(SinkError::Shutdown);
        }

        Ok(PendingRequest {
            id,
            rx,
            waiters: self.waiters.clone(),
        })
    }

    /// Deliver a committed record to its waiter
    ///
    /// # Returns
    /// `true` if a caller was waiting for this ID
    pub fn complete(&self, record: Record) -> bool {
        match self.waiters.remove(&record.id) {
            Some((id, tx)) => {
                if tx.send(Ok(record)).is_err() {
                    debug!("Waiter for record {} went away before delivery", id);
                }
                true
            }
            None => {
                warn!("Committed record {} has no waiter (timed out or cancelled)", record.id);
                false
            }
        }
    }

    /// Deliver the same error to the waiters of every listed ID
    pub fn fail(&self, ids: impl IntoIterator<Item = u64>, error: SinkError) {
        for id in ids {
            if let Some((_, tx)) = self.waiters.remove(&id) {
                let _ = tx.send(Err(error.clone()));
            }
        }
    }

    /// Stop accepting registrations and fail every outstanding waiter with `Shutdown`
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let ids: Vec<u64> = self.waiters.iter().map(|entry| *entry.key()).collect();
        if !ids.is_empty() {
            warn!("Correlator closing with {} outstanding waiters", ids.len());
        }
        self.fail(ids, SinkError::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of callers currently waiting
    pub fn outstanding(&self) -> usize {
        self.waiters.len()
    }
}

/// A caller's handle on its own submission
///
/// Dropping it (for example when the caller's future is cancelled) removes the
/// waiter entry.
pub struct PendingRequest {
    id: u64,
    rx: oneshot::Receiver<Outcome>,
    waiters: Arc<Waiters>,
}

impl PendingRequest {
    /// Wait for the record to be committed
    ///
    /// # Arguments
    /// * `timeout` - Give up after this long; `None` waits until the record is
    ///   committed or the correlator is closed
    ///
    /// # Returns
    /// * `Ok(Record)` once the batch containing the record was written
    /// * `Err(SinkError::Timeout)` if the deadline passed first
    /// * `Err(SinkError::Shutdown)` if the pipeline stopped first
    /// * `Err(SinkError::StoreWrite)` if the record's batch was rejected
    pub async fn wait(mut self, timeout: Option<Duration>) -> Result<Record, SinkError> {
        let received = match timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut self.rx).await {
                Ok(received) => received,
                Err(_) => {
                    debug!("Record {} timed out after {:?}", self.id, limit);
                    return Err(SinkError::Timeout {
                        id: self.id,
                        waited: limit,
                    });
                }
            },
            None => (&mut self.rx).await,
        };

        // Sender dropped without a value: the pipeline went away
        received.unwrap_or(Err(SinkError::Shutdown))
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        self.waiters.remove(&self.id);
    }
}
