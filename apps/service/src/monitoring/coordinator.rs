use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use super::extractor::Extractor;
use super::fetcher::Fetcher;
use super::state::TargetStateStore;
use super::types::{CycleReport, DiffResult, Observation, Target};
use crate::error::{ExtractError, TargetError, panic_message};
use crate::notify::{Notifier, message};

/// Cycle coordinator - runs one polling pass over every target
///
/// Fetching fans out over at most `max_workers` concurrent requests. State is
/// only touched afterwards, sequentially, in the order targets were given.
pub struct CycleCoordinator {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    notifier: Arc<dyn Notifier>,
    store: TargetStateStore,
    max_workers: usize,
    currency: String,
}

impl CycleCoordinator {
    /// Create a new coordinator with an empty state store
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn Extractor>,
        notifier: Arc<dyn Notifier>,
        max_workers: usize,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            notifier,
            store: TargetStateStore::new(),
            max_workers: max_workers.max(1),
            currency: currency.into(),
        }
    }

    pub fn store(&self) -> &TargetStateStore {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Run one cycle over `targets`
    ///
    /// Waits for every fetch to finish before diffing. A failure while handling
    /// one target, panics included, is reported for that target and the rest
    /// still run.
    pub async fn run_cycle(&mut self, targets: &[Target]) -> CycleReport {
        let units: Vec<_> = targets
            .iter()
            .cloned()
            .map(|target| {
                let fetcher = Arc::clone(&self.fetcher);
                let extractor = Arc::clone(&self.extractor);
                async move {
                    let outcome = AssertUnwindSafe(fetch_and_extract(
                        fetcher.as_ref(),
                        extractor.as_ref(),
                        &target,
                    ))
                    .catch_unwind()
                    .await
                    .map_err(|payload| TargetError::Panicked(panic_message(payload.as_ref())))
                    .and_then(|result| result.map_err(TargetError::from));
                    (target.identity, outcome)
                }
            })
            .collect();

        let mut outcomes: HashMap<String, Result<Observation, TargetError>> =
            stream::iter(units).buffer_unordered(self.max_workers).collect().await;

        let mut report = CycleReport::default();
        for target in targets {
            let outcome = outcomes
                .remove(target.identity.as_str())
                .unwrap_or_else(|| Err(TargetError::MissingResult(target.identity.clone())));

            let processed = AssertUnwindSafe(self.process(target, outcome))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(TargetError::Panicked(panic_message(payload.as_ref())))
                });

            match processed {
                Ok(diff) => report.record(&diff),
                Err(e) => {
                    report.failed += 1;
                    error!(product = %target, url = %target.identity, "Check failed: {:#}", e);
                    self.notifier.send(&message::target_error_report(target, &e)).await;
                }
            }
        }

        report
    }

    async fn process(
        &mut self,
        target: &Target,
        outcome: Result<Observation, TargetError>,
    ) -> Result<DiffResult, TargetError> {
        let observation = outcome?;
        let diff = self.store.diff(target, &observation);

        match diff {
            DiffResult::Seeded => {
                info!(
                    product = %target,
                    "Price: {}{}, initial stock: {}",
                    self.currency,
                    observation.price.map_or_else(|| "n/a".into(), |p| format!("{p:.2}")),
                    observation.stock.map_or_else(|| "n/a".into(), |s| s.to_string()),
                );
            }
            DiffResult::Indeterminate => {
                warn!(product = %target, "No data yet, state will be seeded on a later cycle");
            }
            DiffResult::Unchanged if observation.is_empty() => {
                warn!(product = %target, "No data this cycle, keeping previous state");
            }
            DiffResult::Unchanged => {
                debug!(product = %target, "Unchanged");
            }
            DiffResult::Changed { previous_stock, previous_price, new_stock, new_price } => {
                let report = message::change_report(
                    target,
                    &self.currency,
                    (previous_stock, new_stock),
                    (previous_price, new_price),
                );
                info!("{}", report);
                self.notifier.send(&report).await;
            }
        }

        Ok(diff)
    }
}

/// Fetch and extract one target. Fetch failures become an empty observation.
async fn fetch_and_extract(
    fetcher: &dyn Fetcher,
    extractor: &dyn Extractor,
    target: &Target,
) -> Result<Observation, ExtractError> {
    let body = match fetcher.fetch(target).await {
        Ok(body) => body,
        Err(e) => {
            error!(product = %target, url = %target.identity, "Failed to fetch page: {}", e);
            return Ok(Observation::empty());
        }
    };

    let observation = extractor.extract(&body)?;
    if observation.stock.is_none() {
        warn!(product = %target, "Stock not found in page");
    }
    if observation.price.is_none() {
        warn!(product = %target, "Price not found in page");
    }
    Ok(observation)
}
