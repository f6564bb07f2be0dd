//! API Module
//!
//! This module handles the HTTP API for submitting and listing records.

mod server;
pub use server::{router, Server};
