//! Batch Orchestrator Module
//!
//! This module wires the batch pipeline together and owns its background tasks.
//!
//! # Architecture Flow
//! 1. `BatchWindow::push` sends records to the window loop
//! 2. The window loop seals a batch on the size or time trigger
//! 3. The batch is sent to the applier loop over an in-order channel
//! 4. The applier commits it to `RecordStore` and resolves waiters in `Correlator`
//!
//! A supervisor task waits on the applier. When the applier stops, for any
//! reason, it closes the correlator so no caller is left waiting on a stage
//! that no longer runs.

use crate::{
    batch::{BatchApplier, BatchWindow},
    config::BatchConfig,
    correlation::Correlator,
    state::RecordStore,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Running batch pipeline
pub struct BatchOrchestrator {
    window: BatchWindow,
    shutdown_tx: watch::Sender<bool>,
    window_task: JoinHandle<()>,
    supervisor_task: JoinHandle<()>,
}

impl BatchOrchestrator {
    /// Spawn the window, applier and supervisor tasks
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Arguments
    /// * `config` - Batch window thresholds
    /// * `store` - Store the applier writes into
    /// * `correlator` - Waiter table the applier resolves
    pub fn spawn(config: BatchConfig, store: RecordStore, correlator: Correlator) -> Self {
        info!(
            "Batch pipeline starting: max_batch_size={}, timeout_interval_ms={}",
            config.max_batch_size, config.timeout_interval_ms
        );

        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (window, window_loop) = BatchWindow::new(config, batch_tx, shutdown_rx);
        let window_task = tokio::spawn(window_loop.run());

        let applier = BatchApplier::new(store, correlator.clone());
        let applier_task = tokio::spawn(applier.run(batch_rx));

        let supervisor_task = tokio::spawn(async move {
            if let Err(e) = applier_task.await {
                error!("Batch applier terminated abnormally: {:?}", e);
            }
            correlator.close();
        });

        Self {
            window,
            shutdown_tx,
            window_task,
            supervisor_task,
        }
    }

    /// Handle for pushing records into the pipeline
    pub fn window(&self) -> &BatchWindow {
        &self.window
    }

    /// Flush the open window, wait for it to be applied, and stop all tasks
    pub async fn shutdown(self) {
        info!("Batch pipeline shutting down");
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.window_task.await {
            error!("Batch window terminated abnormally: {:?}", e);
        }
        // The window loop dropped its batch sender on exit, so the applier
        // finishes the remaining batches and the supervisor returns.
        if let Err(e) = self.supervisor_task.await {
            error!("Batch supervisor terminated abnormally: {:?}", e);
        }
        info!("Batch pipeline stopped");
    }
}
