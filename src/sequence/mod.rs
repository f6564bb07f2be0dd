//! Sequence Module
//!
//! Issues the IDs assigned to records before they enter a batch window.

mod allocator;
pub use allocator::SequenceAllocator;
