use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Payload submitted by a caller, before an ID has been assigned
///
/// Unknown JSON fields (including a caller-supplied `ID`) are ignored.
/// A missing `Name` is accepted as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(rename = "Name", default)]
    pub name: String,
}

impl NewRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A record carrying its sequence ID
///
/// Returned to the caller once the batch containing it has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Why a batch window was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowTrigger {
    /// The window reached `max_batch_size` items
    Size,
    /// `timeout_interval_ms` elapsed since the first item arrived
    Timeout,
    /// The sink is shutting down and the remaining items were flushed
    Shutdown,
}

/// Sealed batch ready to be applied to the store
#[derive(Debug, Clone)]
pub struct Batch {
    pub batch_id: u64,
    pub records: Vec<Record>,
    pub trigger: WindowTrigger,
    pub sealed_at: DateTime<Utc>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.records.iter().map(|r| r.id)
    }
}

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name too long: {len} bytes, limit is {max}")]
    NameTooLong { len: usize, max: usize },
}

/// Store write errors
///
/// Any of these rejects the whole batch; nothing from it is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record {0} is already committed")]
    AlreadyCommitted(u64),
    #[error("record {0} appears more than once in the batch")]
    DuplicateInBatch(u64),
}

/// Errors returned to a caller of `RecordSink::submit`
///
/// `Clone` because a failed batch hands the same error to every caller in it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("invalid record: {0}")]
    Validation(#[from] ValidationError),
    #[error("record {id} was not committed within {waited:?}")]
    Timeout { id: u64, waited: Duration },
    #[error("record sink is shut down")]
    Shutdown,
    #[error("batch #{batch_id} rejected by store: {source}")]
    StoreWrite { batch_id: u64, source: StoreError },
}
