use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::coordinator::CycleCoordinator;
use super::types::{CycleReport, Target};
use crate::error::{CycleError, panic_message};
use crate::notify::message;

/// Phase of the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Sleeping,
    Running,
}

/// Monitoring scheduler - runs cycles on a fixed interval until shut down
///
/// Cycles never overlap. Whatever happens inside a cycle, the loop goes back
/// to sleep and tries again.
pub struct Scheduler {
    coordinator: CycleCoordinator,
    targets: Vec<Target>,
    interval: Duration,
    state: LoopState,
    cycles: u64,
    last_cycle_at: Option<DateTime<Utc>>,
}

impl Scheduler {
    /// Create a new scheduler over a fixed set of targets
    pub fn new(coordinator: CycleCoordinator, targets: Vec<Target>, interval: Duration) -> Self {
        Self {
            coordinator,
            targets,
            interval,
            state: LoopState::Sleeping,
            cycles: 0,
            last_cycle_at: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn last_cycle_at(&self) -> Option<DateTime<Utc>> {
        self.last_cycle_at
    }

    pub fn coordinator(&self) -> &CycleCoordinator {
        &self.coordinator
    }

    /// Run one cycle, containing anything that escapes it
    pub async fn run_once(&mut self) -> Result<CycleReport, CycleError> {
        self.state = LoopState::Running;
        self.cycles += 1;
        self.last_cycle_at = Some(Utc::now());
        let start = Instant::now();

        let result = AssertUnwindSafe(self.coordinator.run_cycle(&self.targets))
            .catch_unwind()
            .await
            .map_err(|payload| CycleError::Panicked(panic_message(payload.as_ref())));

        match &result {
            Ok(report) => info!(
                cycle = self.cycles,
                targets = report.total(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Cycle finished: {}",
                report
            ),
            Err(e) => {
                error!(cycle = self.cycles, "Monitoring cycle failed: {}", e);
                self.coordinator.notifier().send(&message::cycle_error_report(e)).await;
            }
        }

        self.state = LoopState::Sleeping;
        result
    }

    /// Poll until `shutdown` turns true or its sender goes away
    ///
    /// Shutdown is observed between cycles; a running cycle always completes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Self {
        info!("Monitoring {} targets every {:?}", self.targets.len(), self.interval);

        while !*shutdown.borrow() {
            // Errors were already logged and reported
            let _ = self.run_once().await;
            debug!(state = ?self.state(), "Next cycle in {:?}", self.interval);

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!(cycles = self.cycles, "Monitoring stopped");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::monitoring::extractor::PatternExtractor;
    use crate::monitoring::fetcher::{Fetcher, RawResult};
    use crate::monitoring::testing::{ScriptedFetcher, page};
    use crate::notify::Notifier;
    use crate::notify::testing::RecordingNotifier;

    /// Panics on its first call, then serves a fixed page
    #[derive(Default)]
    struct PanicOnceFetcher {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Fetcher for PanicOnceFetcher {
        async fn fetch(&self, _target: &Target) -> RawResult {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("parser exploded");
            }
            Ok(page(1, 1.0))
        }
    }

    /// Records messages but panics on per-target error reports
    #[derive(Default)]
    struct FragileNotifier {
        inner: RecordingNotifier,
    }

    #[async_trait::async_trait]
    impl Notifier for FragileNotifier {
        async fn send(&self, message: &str) {
            if message.contains("check failed") {
                panic!("sink formatter broke");
            }
            self.inner.send(message).await;
        }
    }

    fn scheduler(fetcher: Arc<dyn Fetcher>, notifier: Arc<dyn Notifier>) -> Scheduler {
        let extractor = PatternExtractor::new(r"stock=(\d+)", r"price=(\d+\.\d+)").unwrap();
        let coordinator = CycleCoordinator::new(fetcher, Arc::new(extractor), notifier, 2, "");
        let targets = vec![Target::new("https://shop.example.com/item/1", "Item 1")];
        Scheduler::new(coordinator, targets, Duration::from_secs(180))
    }

    #[tokio::test]
    async fn test_run_once_returns_report() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        fetcher.script("https://shop.example.com/item/1", [Ok(page(2, 5.0))]);
        let mut scheduler = scheduler(fetcher, Arc::new(RecordingNotifier::default()));

        let report = scheduler.run_once().await.unwrap();

        assert_eq!(report.seeded, 1);
        assert_eq!(scheduler.cycles(), 1);
        assert_eq!(scheduler.state(), LoopState::Sleeping);
        assert!(scheduler.last_cycle_at().is_some());
    }

    #[tokio::test]
    async fn test_target_panic_does_not_fail_cycle() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut scheduler = scheduler(Arc::new(PanicOnceFetcher::default()), notifier.clone());

        let first = scheduler.run_once().await.unwrap();
        assert_eq!(first.failed, 1);

        let messages = notifier.take();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Item 1 check failed:"));
        assert!(messages[0].contains("parser exploded"));

        let second = scheduler.run_once().await.unwrap();
        assert_eq!(second.seeded, 1);
    }

    #[tokio::test]
    async fn test_panic_escaping_cycle_is_contained() {
        let notifier = Arc::new(FragileNotifier::default());
        let mut scheduler = scheduler(Arc::new(PanicOnceFetcher::default()), notifier.clone());

        let first = scheduler.run_once().await;
        assert_eq!(first, Err(CycleError::Panicked("sink formatter broke".into())));
        assert_eq!(scheduler.state(), LoopState::Sleeping);

        let messages = notifier.inner.take();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Monitoring cycle failed:"));
        assert!(messages[0].contains("sink formatter broke"));

        let second = scheduler.run_once().await.unwrap();
        assert_eq!(second.seeded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_keeps_polling_until_shutdown() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        fetcher.script("https://shop.example.com/item/1", [Ok(page(2, 5.0))]);
        let scheduler = scheduler(fetcher.clone(), Arc::new(RecordingNotifier::default()));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));

        while fetcher.calls() < 3 {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        tx.send(true).unwrap();

        let scheduler = handle.await.unwrap();
        assert!(scheduler.cycles() >= 3);
        assert_eq!(scheduler.state(), LoopState::Sleeping);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_are_spaced_by_interval() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        fetcher.script("https://shop.example.com/item/1", [Ok(page(2, 5.0))]);
        let scheduler = scheduler(fetcher.clone(), Arc::new(RecordingNotifier::default()));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));

        tokio::time::sleep(Duration::from_secs(179)).await;
        assert_eq!(fetcher.calls(), 1);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fetcher.calls(), 2);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_before_start_runs_nothing() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let scheduler = scheduler(fetcher.clone(), Arc::new(RecordingNotifier::default()));

        let (_tx, rx) = watch::channel(true);
        let scheduler = scheduler.run(rx).await;

        assert_eq!(scheduler.cycles(), 0);
        assert_eq!(fetcher.calls(), 0);
    }
}
