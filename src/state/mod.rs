//! State Management Module
//!
//! This module holds the in-memory store that committed records are written into.
//! The store is written by the batch applier and read by everything else.

mod store;
pub use store::RecordStore;
