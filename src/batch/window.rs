//! Batch Window Module
//!
//! Submitters push records through a `BatchWindow` handle without blocking.
//! A single `WindowLoop` task receives them, keeps the open window, and emits
//! a sealed batch whenever the size or time trigger fires.
//!
//! # Shutdown
//! When the shutdown signal fires (or every handle is dropped) the loop stops
//! accepting records, drains what was already pushed, emits it and exits.
//! Nothing that was successfully pushed is dropped.

use crate::{
    batch::{BatchEngine, OpenWindow},
    config::BatchConfig,
    Batch, Record, SinkError, WindowTrigger,
};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Submission side of the batch window
#[derive(Clone)]
pub struct BatchWindow {
    tx: mpsc::UnboundedSender<Record>,
}

impl BatchWindow {
    /// Creates a window handle and the loop that drives it
    ///
    /// # Arguments
    /// * `config` - Size and time thresholds
    /// * `output` - Where sealed batches are sent
    /// * `shutdown` - Flips to `true` when the window must flush and stop
    pub fn new(
        config: BatchConfig,
        output: mpsc::UnboundedSender<Batch>,
        shutdown: watch::Receiver<bool>,
    ) -> (Self, WindowLoop) {
        let (tx, rx) = mpsc::unbounded_channel();

        let window_loop = WindowLoop {
            rx,
            output,
            shutdown,
            engine: BatchEngine::new(),
            timeout: config.timeout(),
            max_batch_size: config.max_batch_size,
        };

        (Self { tx }, window_loop)
    }

    /// Enqueue a record into the current window
    ///
    /// # Returns
    /// `Err(SinkError::Shutdown)` once the window has stopped accepting records
    pub fn push(&self, record: Record) -> Result<(), SinkError> {
        self.tx.send(record).map_err(|_| SinkError::Shutdown)
    }
}

/// Background task that closes windows and emits batches
pub struct WindowLoop {
    rx: mpsc::UnboundedReceiver<Record>,
    output: mpsc::UnboundedSender<Batch>,
    shutdown: watch::Receiver<bool>,
    engine: BatchEngine,
    timeout: Duration,
    max_batch_size: usize,
}

impl WindowLoop {
    /// Run until shutdown, then flush the last partial window
    pub async fn run(mut self) {
        info!(
            max_batch_size = self.max_batch_size,
            timeout_interval_ms = self.timeout.as_millis() as u64,
            "Batch window started"
        );

        let mut window = OpenWindow::new(self.max_batch_size);

        loop {
            // Only polled while the window is non-empty
            let deadline = window
                .deadline(self.timeout)
                .unwrap_or_else(|| Instant::now() + self.timeout);

            tokio::select! {
                biased;

                _ = sleep_until(deadline), if !window.is_empty() => {
                    debug!(batch_size = window.len(), trigger = "timeout", "Closing window");
                    self.emit(&mut window, WindowTrigger::Timeout);
                }

                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }

                received = self.rx.recv() => match received {
                    Some(record) => {
                        if let Some(trigger) = window.push(record) {
                            debug!(batch_size = window.len(), trigger = "size", "Closing window");
                            self.emit(&mut window, trigger);
                        }
                    }
                    // Every handle dropped
                    None => break,
                },
            }
        }

        // Stop new pushes, then drain what is already queued
        self.rx.close();
        while let Some(record) = self.rx.recv().await {
            if let Some(trigger) = window.push(record) {
                self.emit(&mut window, trigger);
            }
        }
        if !window.is_empty() {
            info!(batch_size = window.len(), "Flushing final window before shutdown");
            self.emit(&mut window, WindowTrigger::Shutdown);
        }

        info!(batches = self.engine.sealed(), "Batch window stopped");
    }

    fn emit(&mut self, window: &mut OpenWindow, trigger: WindowTrigger) {
        let batch = self.engine.create_batch(window.take(), trigger);
        let batch_id = batch.batch_id;

        if self.output.send(batch).is_err() {
            // The supervisor fails the affected callers once the applier is gone
            warn!("Batch #{} dropped: applier is not running", batch_id);
        }
    }
}
