//! Result Correlation Module
//!
//! Routes each committed record back to the one caller that submitted it.
//! Waiters are indexed by record ID, so a completion is delivered with a
//! single map lookup instead of every caller filtering a shared stream.

mod correlator;
pub use correlator::{Correlator, PendingRequest};
