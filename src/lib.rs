//! This crate batches individually submitted records, commits each batch
//! atomically to an in-memory store, and hands every caller back exactly the
//! committed record that belongs to its own submission.
//! It includes modules for data types, ID allocation, batching, result
//! correlation, the ingest API, the HTTP boundary, and configuration.

pub mod types; // Records, batches and error types shared by every stage.
pub mod api; // HTTP routes in front of the record sink.
pub mod validation; // Payload checks performed before an ID is allocated.
pub mod state; // The in-memory store committed records are written into.
pub mod sequence; // Lock-free record ID allocation.
pub mod batch; // Windowing, sealing and applying batches.
pub mod correlation; // Routes committed records back to their callers.
pub mod sink; // The public submit/list API tying the pipeline together.
pub mod config; // Defines and loads system configuration.

// Re-export commonly used types and configurations for easier access.
pub use types::*;
pub use config::Config;
pub use sink::RecordSink;
