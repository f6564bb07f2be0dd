//! Batch Pipeline Module
//!
//! This module turns the stream of individually submitted records into
//! committed batches:
//! - BatchWindow: Accumulates records and closes a window on size or timeout
//! - Trigger: Tracks the open window and decides when it must close
//! - BatchEngine: Seals a closed window into a numbered batch
//! - BatchApplier: Writes each batch to the store and notifies its callers
//! - BatchOrchestrator: Spawns and supervises the background tasks

mod applier;
mod engine;
pub mod orchestrator;
mod trigger;
mod window;

pub use applier::BatchApplier;
pub use engine::BatchEngine;
pub use orchestrator::BatchOrchestrator;
pub use trigger::OpenWindow;
pub use window::{BatchWindow, WindowLoop};

#[cfg(test)]
mod tests;
