use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free record ID allocator
///
/// IDs start at 1 and are never reused for the lifetime of the allocator.
#[derive(Debug, Default)]
pub struct SequenceAllocator {
    last: AtomicU64,
}

impl SequenceAllocator {
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Returns the next ID. Concurrent callers never receive the same value.
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Last ID handed out, or 0 if none yet
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::Relaxed)
    }
}
