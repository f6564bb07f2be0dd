//! Batch Trigger Module
//!
//! Tracks the records of the window that is currently open and decides when
//! it has to close:
//! - Size trigger: the window holds `max_batch_size` records
//! - Time trigger: `timeout` has elapsed since the first record arrived
//!
//! An empty window has no deadline, so the timer never produces empty batches.

use crate::{Record, WindowTrigger};
use std::time::Duration;
use tokio::time::Instant;

/// The window currently accumulating records
pub struct OpenWindow {
    records: Vec<Record>,
    opened_at: Option<Instant>,
    max_batch_size: usize,
}

impl OpenWindow {
    pub fn new(max_batch_size: usize) -> Self {
        Self {
            records: Vec::with_capacity(max_batch_size),
            opened_at: None,
            max_batch_size,
        }
    }

    /// Add a record, opening the window if it was empty
    ///
    /// # Returns
    /// `Some(WindowTrigger::Size)` if the window is now full and must close
    pub fn push(&mut self, record: Record) -> Option<WindowTrigger> {
        if self.records.is_empty() {
            self.opened_at = Some(Instant::now());
        }
        self.records.push(record);

        (self.records.len() >= self.max_batch_size).then_some(WindowTrigger::Size)
    }

    /// When the open window times out, or `None` if nothing is pending
    pub fn deadline(&self, timeout: Duration) -> Option<Instant> {
        self.opened_at.map(|opened| opened + timeout)
    }

    /// Close the window, returning its records in arrival order
    pub fn take(&mut self) -> Vec<Record> {
        self.opened_at = None;
        std::mem::replace(&mut self.records, Vec::with_capacity(self.max_batch_size))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
