//! Sweep Engine
//!
//! Four independently invocable, idempotent passes that reconcile stored item
//! status against elapsed wall-clock time:
//!
//! | Sweep            | Scans                                      | Transition                         |
//! |------------------|--------------------------------------------|------------------------------------|
//! | `pickup_timeout` | `waiting_pickup` + pending orders          | item -> normal, order -> cancelled |
//! | `window_start`   | `waiting_optimal_time` + latest self-dry   | item -> self_drying                |
//! | `window_end`     | `self_drying` + latest self-dry with end   | item -> normal, score <- predicted |
//! | `reconcile`      | both self-dry statuses (API-key gated)     | complete-if-expired                |
//!
//! Every pass samples the clock once, then loops sequentially over its batch.
//! Store read errors before the batch is formed are fatal for the pass;
//! anything after that is recorded per item and the loop continues.

mod gate;
mod pickup_timeout;
mod reconcile;
mod report;
mod scheduler;
mod window_end;
mod window_start;

pub use gate::ReconcileGate;
pub use report::{SweepKind, SweepReport, SweepTally};
pub use scheduler::SweepScheduler;

use crate::application::constants::DEFAULT_PICKUP_GRACE_MS;
use crate::application::notify::OwnerNotifier;
use crate::domain::SweepClock;
use crate::error::Result;
use crate::port::{HistoryLedger, ItemStore, OrderStore, TimeProvider, TransactionalDryingStore};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// The stores every sweep and entry operation composes
///
/// Multi-record writes go through `transactions`; single reads and
/// single-row writes use the per-record ports.
#[derive(Clone)]
pub struct DryingStores {
    pub items: Arc<dyn ItemStore>,
    pub orders: Arc<dyn OrderStore>,
    pub history: Arc<dyn HistoryLedger>,
    pub transactions: Arc<dyn TransactionalDryingStore>,
}

impl DryingStores {
    /// One backend implementing every port
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: ItemStore + OrderStore + HistoryLedger + TransactionalDryingStore + 'static,
    {
        Self {
            items: backend.clone(),
            orders: backend.clone(),
            history: backend.clone(),
            transactions: backend,
        }
    }
}

/// Sweep tuning
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    /// How long a pending order may wait for a helper
    pub pickup_grace_ms: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            pickup_grace_ms: DEFAULT_PICKUP_GRACE_MS,
        }
    }
}

/// Runs the timeout sweeps
pub struct SweepEngine {
    stores: DryingStores,
    owner_notifier: OwnerNotifier,
    time_provider: Arc<dyn TimeProvider>,
    config: SweepConfig,
}

impl SweepEngine {
    pub fn new(
        stores: DryingStores,
        owner_notifier: OwnerNotifier,
        time_provider: Arc<dyn TimeProvider>,
        config: SweepConfig,
    ) -> Self {
        Self {
            stores,
            owner_notifier,
            time_provider,
            config,
        }
    }

    /// Pickup timeout (helper path)
    pub async fn run_pickup_timeout(&self) -> SweepReport {
        self.run(SweepKind::PickupTimeout, |clock| self.pickup_timeout_pass(clock))
            .await
    }

    /// Self-dry window start
    pub async fn run_window_start(&self) -> SweepReport {
        self.run(SweepKind::WindowStart, |clock| self.window_start_pass(clock))
            .await
    }

    /// Self-dry window end
    pub async fn run_window_end(&self) -> SweepReport {
        self.run(SweepKind::WindowEnd, |clock| self.window_end_pass(clock))
            .await
    }

    /// Generic expired-drying reconciler; `api_key` is checked before any
    /// store access
    pub async fn run_reconcile(&self, gate: &ReconcileGate, api_key: Option<&str>) -> SweepReport {
        if let Err(e) = gate.authorize(api_key) {
            error!(error = %e, "Reconcile sweep rejected");
            return SweepReport::fatal(SweepKind::Reconcile, &e);
        }
        self.run(SweepKind::Reconcile, |clock| self.reconcile_pass(clock))
            .await
    }

    /// Sample the clock once, run the pass, fold fatal errors into the report
    async fn run<'a, F, Fut>(&'a self, kind: SweepKind, pass: F) -> SweepReport
    where
        F: FnOnce(SweepClock) -> Fut,
        Fut: Future<Output = Result<SweepReport>> + 'a,
    {
        let clock = SweepClock::sample(self.time_provider.as_ref());
        info!(sweep = %kind, now = clock.now(), "Sweep started");

        match pass(clock).await {
            Ok(report) => {
                info!(
                    sweep = %kind,
                    processed = report.processed_count,
                    updated = report.updated_count,
                    errors = report.errors.len(),
                    "Sweep finished"
                );
                report
            }
            Err(e) => {
                error!(sweep = %kind, error = %e, "Sweep aborted");
                SweepReport::fatal(kind, &e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::{DryingWindow, HistoryRecord, Item, ItemStatus, MiteScore, Order};
    use crate::port::mocks::InMemoryDryingStore;
    use crate::port::notifier::mocks::MockNotifier;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use crate::port::user_directory::mocks::MockUserDirectory;

    pub const NOW: i64 = 1_700_000_000_000;
    pub const MINUTE: i64 = 60 * 1000;

    pub struct Harness {
        pub store: InMemoryDryingStore,
        pub notifier: Arc<MockNotifier>,
        pub clock: Arc<FixedTimeProvider>,
        pub engine: SweepEngine,
    }

    impl Harness {
        pub fn new() -> Self {
            Self::with_notifier(MockNotifier::new_success())
        }

        pub fn with_notifier(notifier: MockNotifier) -> Self {
            let clock = Arc::new(FixedTimeProvider::new(NOW));
            let store = InMemoryDryingStore::new(clock.clone());
            let notifier = Arc::new(notifier);
            let users = Arc::new(
                MockUserDirectory::default().with_user("owner-1", "owner@example.com", "Owner"),
            );
            let engine = SweepEngine::new(
                DryingStores::from_backend(Arc::new(store.clone())),
                OwnerNotifier::new(users, notifier.clone()),
                clock.clone(),
                SweepConfig::default(),
            );
            Self {
                store,
                notifier,
                clock,
                engine,
            }
        }

        pub async fn item(&self, id: &str, status: ItemStatus, score: i64) {
            self.item_owned_by(id, "owner-1", status, score).await;
        }

        pub async fn item_owned_by(&self, id: &str, owner: &str, status: ItemStatus, score: i64) {
            let mut item = Item::new(id, owner, MiteScore::new(score).unwrap(), NOW - 60 * MINUTE);
            item.status = status;
            ItemStore::insert(&self.store, &item).await.unwrap();
        }

        pub async fn window(
            &self,
            id: &str,
            item_id: &str,
            start: i64,
            end: i64,
            after: Option<i64>,
            created_at: i64,
        ) {
            let record = HistoryRecord::self_dry(
                id,
                item_id,
                DryingWindow::new(start, end).unwrap(),
                MiteScore::new(80).unwrap(),
                after.map(|s| MiteScore::new(s).unwrap()),
                created_at,
            );
            HistoryLedger::insert(&self.store, &record).await.unwrap();
        }

        pub async fn pending_order(&self, id: &str, item_id: &str, created_at: i64) -> Order {
            let order = Order::new(id, item_id, None, created_at);
            OrderStore::insert(&self.store, &order).await.unwrap();
            order
        }
    }
}
