//! Record Sink Module
//!
//! The public ingest API. Each `submit` call allocates an ID, registers a
//! waiter, pushes the record into the batch window and waits for exactly its
//! own committed record.

mod ingest;
pub use ingest::RecordSink;
