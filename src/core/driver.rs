use crate::core::ledger::Ledger;
use crate::core::order::OrderAccumulator;
use crate::core::selection::{ContentFilter, SelectionEngine};
use crate::domain::model::{Candidate, RunMode, RunStatus};
use crate::domain::ports::{Catalog, PageSource, PurchaseExecutor, Storage};
use crate::utils::error::{BasketError, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_MAX_CYCLES: usize = 500;

#[derive(Debug, Clone, Copy)]
pub struct DriverSettings {
    pub target: f64,
    pub max_cycles: usize,
    pub mode: RunMode,
}

impl DriverSettings {
    pub fn new(target: f64) -> Self {
        Self {
            target,
            max_cycles: DEFAULT_MAX_CYCLES,
            mode: RunMode::Live,
        }
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub order: OrderAccumulator,
    pub cycles: usize,
    pub status: RunStatus,
}

/// Fetches pages and buys random items from them until the spending target is met.
pub struct Driver<C, P, F, R: Rng = StdRng> {
    catalog: C,
    executor: P,
    filter: F,
    engine: SelectionEngine<R>,
    settings: DriverSettings,
}

impl<C, P, F> Driver<C, P, F, StdRng>
where
    C: Catalog,
    P: PurchaseExecutor,
    F: ContentFilter,
{
    pub fn new(catalog: C, executor: P, filter: F, settings: DriverSettings) -> Self {
        Self::with_rng(catalog, executor, filter, settings, StdRng::from_entropy())
    }
}

impl<C, P, F, R> Driver<C, P, F, R>
where
    C: Catalog,
    P: PurchaseExecutor,
    F: ContentFilter,
    R: Rng,
{
    pub fn with_rng(catalog: C, executor: P, filter: F, settings: DriverSettings, rng: R) -> Self {
        Self {
            catalog,
            executor,
            filter,
            engine: SelectionEngine::new(rng),
            settings,
        }
    }

    /// Runs until the target is met or `max_cycles` pages have been tried.
    ///
    /// Only authentication failures and ledger write failures end the run with
    /// an error; unavailable pages, duplicates and unpriceable items are skipped.
    pub async fn run<S, G>(&mut self, ledger: &mut Ledger<S>, pages: &mut G) -> Result<RunReport>
    where
        S: Storage,
        G: PageSource + ?Sized,
    {
        let target = self.settings.target;
        let mut order = OrderAccumulator::new();
        let mut cycles = 0;

        tracing::info!(
            "🛒 Collecting items worth {:.2} ({:?} mode, ledger holds {} items)",
            target,
            self.settings.mode,
            ledger.len()
        );

        while !order.is_target_met(target) {
            if cycles >= self.settings.max_cycles {
                tracing::warn!(
                    "Stopping after {} cycles with {:.2} of {:.2} collected",
                    cycles,
                    order.total(),
                    target
                );
                return Ok(RunReport {
                    order,
                    cycles,
                    status: RunStatus::CycleLimitReached,
                });
            }
            cycles += 1;

            let page_ref = pages.next_page_ref();
            let batch = match self.catalog.fetch(&page_ref).await? {
                Some(batch) => batch,
                None => {
                    tracing::warn!("Page {} unavailable, trying another", page_ref);
                    continue;
                }
            };

            let ceiling = order.remaining(target);
            let selection = self.engine.select(&batch, &*ledger, ceiling, &self.filter);
            tracing::debug!(
                "Cycle {}: {} candidates on page, {} selected for {:.2} (ceiling {:.2})",
                cycles,
                batch.len(),
                selection.accepted.len(),
                selection.total,
                ceiling
            );

            for candidate in selection.accepted {
                self.commit(candidate, ledger, &mut order).await?;
            }
        }

        tracing::info!(
            "✅ Target reached: {} items for {:.2} after {} cycles",
            order.len(),
            order.total(),
            cycles
        );
        Ok(RunReport {
            order,
            cycles,
            status: RunStatus::TargetMet,
        })
    }

    async fn commit<S: Storage>(
        &self,
        candidate: Candidate,
        ledger: &mut Ledger<S>,
        order: &mut OrderAccumulator,
    ) -> Result<()> {
        let dry_run = self.settings.mode == RunMode::DryRun;

        if !dry_run {
            match ledger
                .record(candidate.item.clone(), candidate.price, Utc::now())
                .await
            {
                Ok(()) => {}
                Err(e) if is_skippable(&e) => {
                    tracing::debug!("Skipping {}: {}", candidate.item, e);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        match order.add(candidate.clone()) {
            Ok(()) => {}
            Err(e) if is_skippable(&e) => {
                tracing::debug!("Skipping {}: {}", candidate.item, e);
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        tracing::info!("Add {} ({:.2}€) to basket", candidate.item, candidate.price);
        if dry_run {
            return Ok(());
        }

        match self.executor.submit(&candidate).await {
            Ok(()) => Ok(()),
            Err(e @ BasketError::Authentication { .. }) => Err(e),
            Err(e) => {
                // The ledger keeps the entry; the operator reconciles the basket.
                tracing::warn!("Submitting {} failed: {}", candidate.item, e);
                Ok(())
            }
        }
    }
}

/// Candidate-level rejections that drop one item without ending the run.
fn is_skippable(error: &BasketError) -> bool {
    error.is_duplicate() || matches!(error, BasketError::Validation { .. })
}
