//! Tests for the batch pipeline
//!
//! Timer-sensitive tests run on a paused clock so the window deadline is exact.

#[cfg(test)]
mod tests {
    use crate::{
        batch::{BatchApplier, BatchEngine, BatchOrchestrator, BatchWindow, OpenWindow},
        config::BatchConfig,
        correlation::Correlator,
        state::RecordStore,
        Batch, Record, SinkError, StoreError, WindowTrigger,
    };
    use std::time::Duration;
    use tokio::sync::{mpsc, watch};
    use tokio::time::Instant;

    fn record(id: u64) -> Record {
        Record {
            id,
            name: id.to_string(),
        }
    }

    fn config(max_batch_size: usize, timeout_interval_ms: u64) -> BatchConfig {
        BatchConfig {
            max_batch_size,
            timeout_interval_ms,
        }
    }

    /// Spawn a window loop and return its handle, output and shutdown switch
    fn spawn_window(
        config: BatchConfig,
    ) -> (
        BatchWindow,
        mpsc::UnboundedReceiver<Batch>,
        watch::Sender<bool>,
        tokio::task::JoinHandle<()>,
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (window, window_loop) = BatchWindow::new(config, out_tx, shutdown_rx);
        let task = tokio::spawn(window_loop.run());
        (window, out_rx, shutdown_tx, task)
    }

    #[test]
    fn test_open_window_size_trigger() {
        let mut window = OpenWindow::new(3);
        assert!(window.deadline(Duration::from_millis(10)).is_none());

        assert_eq!(window.push(record(1)), None);
        assert!(window.deadline(Duration::from_millis(10)).is_some());
        assert_eq!(window.push(record(2)), None);
        assert_eq!(window.push(record(3)), Some(WindowTrigger::Size));

        let taken = window.take();
        assert_eq!(taken.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(window.is_empty());
        assert!(window.deadline(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_engine_assigns_sequential_batch_ids() {
        let mut engine = BatchEngine::new();
        let first = engine.create_batch(vec![record(1)], WindowTrigger::Size);
        let second = engine.create_batch(vec![record(2)], WindowTrigger::Timeout);

        assert_eq!(first.batch_id, 1);
        assert_eq!(second.batch_id, 2);
        assert_eq!(second.trigger, WindowTrigger::Timeout);
        assert!(first.sealed_at <= second.sealed_at);
        assert_eq!(engine.sealed(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_size_trigger_does_not_wait_for_timer() {
        let (window, mut out, _shutdown, _task) = spawn_window(config(10, 10));
        let start = Instant::now();

        for id in 1..=25 {
            window.push(record(id)).unwrap();
        }

        let first = out.recv().await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first.trigger, WindowTrigger::Size);
        assert_eq!(first.ids().collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());

        let second = out.recv().await.unwrap();
        assert_eq!(second.len(), 10);
        assert_eq!(second.trigger, WindowTrigger::Size);
        // Both full batches were released before the window timeout
        assert!(start.elapsed() < Duration::from_millis(10));

        let rest = out.recv().await.unwrap();
        assert_eq!(rest.len(), 5);
        assert_eq!(rest.trigger, WindowTrigger::Timeout);
        assert_eq!(rest.batch_id, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_flushes_partial_window() {
        let (window, mut out, _shutdown, _task) = spawn_window(config(10, 10));
        let start = Instant::now();

        window.push(record(1)).unwrap();
        window.push(record(2)).unwrap();
        window.push(record(3)).unwrap();

        let batch = out.recv().await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.trigger, WindowTrigger::Timeout);
        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_millis(15), "took {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_window_emits_nothing() {
        let (_window, mut out, _shutdown, _task) = spawn_window(config(10, 10));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(out.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_and_rejects_new_pushes() {
        let (window, mut out, shutdown, task) = spawn_window(config(10, 1_000));

        window.push(record(1)).unwrap();
        window.push(record(2)).unwrap();
        shutdown.send(true).unwrap();
        task.await.unwrap();

        let batch = out.recv().await.unwrap();
        assert_eq!(batch.trigger, WindowTrigger::Shutdown);
        assert_eq!(batch.ids().collect::<Vec<_>>(), vec![1, 2]);
        // The loop dropped its output sender on exit
        assert!(out.recv().await.is_none());

        assert_eq!(window.push(record(3)), Err(SinkError::Shutdown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_splits_backlog_into_full_batches() {
        let (window, mut out, shutdown, task) = spawn_window(config(4, 1_000));

        for id in 1..=10 {
            window.push(record(id)).unwrap();
        }
        shutdown.send(true).unwrap();
        task.await.unwrap();

        let mut sizes = Vec::new();
        while let Some(batch) = out.recv().await {
            assert!(batch.len() <= 4);
            sizes.push(batch.len());
        }
        assert_eq!(sizes.iter().sum::<usize>(), 10);
    }

    #[tokio::test]
    async fn test_applier_commits_and_notifies() {
        let store = RecordStore::new();
        let correlator = Correlator::new();
        let applier = BatchApplier::new(store.clone(), correlator.clone());

        let first = correlator.register(1).unwrap();
        let second = correlator.register(2).unwrap();

        let batch =
            BatchEngine::new().create_batch(vec![record(1), record(2)], WindowTrigger::Size);
        assert_eq!(applier.apply(batch).await.unwrap(), 2);

        assert_eq!(first.wait(None).await.unwrap(), record(1));
        assert_eq!(second.wait(None).await.unwrap(), record(2));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_rejected_batch_fails_only_its_callers() {
        let store = RecordStore::new();
        let correlator = Correlator::new();
        let applier = BatchApplier::new(store.clone(), correlator.clone());
        let mut engine = BatchEngine::new();

        // Record 1 is committed once up front
        let early = correlator.register(1).unwrap();
        applier
            .apply(engine.create_batch(vec![record(1)], WindowTrigger::Size))
            .await
            .unwrap();
        early.wait(None).await.unwrap();

        let bystander = correlator.register(9).unwrap();
        let victim = correlator.register(2).unwrap();

        // A batch repeating ID 1 alongside ID 2 must be rejected as a whole
        let bad = engine.create_batch(vec![record(2), record(1)], WindowTrigger::Timeout);
        let err = applier.apply(bad).await.unwrap_err();
        assert_eq!(
            err,
            SinkError::StoreWrite {
                batch_id: 2,
                source: StoreError::AlreadyCommitted(1)
            }
        );

        assert_eq!(victim.wait(None).await.unwrap_err(), err);
        assert_eq!(store.get(2).await, None);
        assert_eq!(store.len().await, 1);

        // Unrelated caller is untouched and still outstanding
        assert_eq!(correlator.outstanding(), 1);
        drop(bystander);
    }

    #[tokio::test(start_paused = true)]
    async fn test_orchestrator_applies_then_shuts_down() {
        let store = RecordStore::new();
        let correlator = Correlator::new();
        let orchestrator =
            BatchOrchestrator::spawn(config(10, 10), store.clone(), correlator.clone());

        let pending: Vec<_> = (1..=3).map(|id| correlator.register(id).unwrap()).collect();
        for id in 1..=3 {
            orchestrator.window().push(record(id)).unwrap();
        }
        for (i, p) in pending.into_iter().enumerate() {
            assert_eq!(p.wait(None).await.unwrap(), record(i as u64 + 1));
        }

        // Pushed but still inside an open window when shutdown is requested
        let late = correlator.register(4).unwrap();
        orchestrator.window().push(record(4)).unwrap();
        orchestrator.shutdown().await;

        assert_eq!(late.wait(None).await.unwrap(), record(4));
        assert_eq!(store.len().await, 4);
        assert!(correlator.is_closed());
    }

    #[tokio::test]
    async fn test_stopped_applier_closes_correlator() {
        let store = RecordStore::new();
        let correlator = Correlator::new();
        let orchestrator = BatchOrchestrator::spawn(config(10, 10), store, correlator.clone());

        let stranded = correlator.register(42).unwrap();
        orchestrator.shutdown().await;

        // Never pushed, so it can only be failed by the supervisor closing the table
        assert_eq!(stranded.wait(None).await.unwrap_err(), SinkError::Shutdown);
    }
}
