//! Batch Engine Module
//!
//! This module is responsible for sealing closed windows into batches.
//! Each batch is assigned a unique sequential ID and timestamp.

use crate::{Batch, Record, WindowTrigger};

/// Batch sealing engine
///
/// Maintains a sequential batch ID counter.
pub struct BatchEngine {
    /// Next batch ID to assign (starts at 1, increments for each batch)
    next_batch_id: u64,
}

impl Default for BatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchEngine {
    pub fn new() -> Self {
        Self { next_batch_id: 1 }
    }

    /// Seal records into a batch
    ///
    /// # Arguments
    /// * `records` - Records of the closed window, in arrival order
    /// * `trigger` - Why the window was closed
    ///
    /// # Returns
    /// A sealed `Batch` ready to be applied to the store
    pub fn create_batch(&mut self, records: Vec<Record>, trigger: WindowTrigger) -> Batch {
        let batch = Batch {
            batch_id: self.next_batch_id,
            records,
            trigger,
            sealed_at: chrono::Utc::now(),
        };

        self.next_batch_id += 1;
        batch
    }

    /// Number of batches sealed so far
    pub fn sealed(&self) -> u64 {
        self.next_batch_id - 1
    }
}
