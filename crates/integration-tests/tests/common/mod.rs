//! Shared wiring: real SQLite store, fixed clock, recording notifier

#![allow(dead_code)]

use std::sync::Arc;

use futon_core::application::{
    DryingStores, LifecycleService, OwnerNotifier, ReconcileGate, SweepConfig, SweepEngine,
};
use futon_core::domain::{
    DryingWindow, HistoryId, HistoryRecord, Item, ItemStatus, MiteScore, Order, OrderId,
};
use futon_core::port::id_provider::mocks::SequentialIdProvider;
use futon_core::port::notifier::mocks::MockNotifier;
use futon_core::port::time_provider::mocks::FixedTimeProvider;
use futon_core::port::{HistoryLedger, ItemStore, OrderStore, UserContact};
use futon_infra_sqlite::{create_pool, run_migrations, SqliteDryingStore, SqliteUserDirectory};

pub const NOW: i64 = 1_700_000_000_000;
pub const MINUTE: i64 = 60 * 1000;
pub const OWNER: &str = "owner-1";
pub const API_KEY: &str = "integration-secret";

pub struct Fixture {
    pub store: Arc<SqliteDryingStore>,
    pub clock: Arc<FixedTimeProvider>,
    pub notifier: Arc<MockNotifier>,
    pub engine: Arc<SweepEngine>,
    pub lifecycle: Arc<LifecycleService>,
    pub gate: ReconcileGate,
    pub stores: DryingStores,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_notifier(MockNotifier::new_success()).await
    }

    pub async fn with_notifier(notifier: MockNotifier) -> Self {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let users = SqliteUserDirectory::new(pool.clone());
        users
            .upsert_user(
                OWNER,
                &UserContact {
                    email: "owner@example.com".to_string(),
                    display_name: "Owner".to_string(),
                },
                NOW,
            )
            .await
            .unwrap();

        let clock = Arc::new(FixedTimeProvider::new(NOW));
        let store = Arc::new(SqliteDryingStore::new(pool, clock.clone()));
        let stores = DryingStores::from_backend(store.clone());
        let notifier = Arc::new(notifier);
        let owner_notifier = OwnerNotifier::new(Arc::new(users), notifier.clone());

        let engine = Arc::new(SweepEngine::new(
            stores.clone(),
            owner_notifier.clone(),
            clock.clone(),
            SweepConfig::default(),
        ));
        let lifecycle = Arc::new(LifecycleService::new(
            stores.clone(),
            Arc::new(SequentialIdProvider::default()),
            clock.clone(),
            owner_notifier,
        ));

        Self {
            store,
            clock,
            notifier,
            engine,
            lifecycle,
            gate: ReconcileGate::new(Some(API_KEY.to_string())),
            stores,
        }
    }

    pub async fn item(&self, id: &str, status: ItemStatus, score: i64) {
        let mut item = Item::new(id, OWNER, MiteScore::new(score).unwrap(), NOW - 120 * MINUTE);
        item.status = status;
        ItemStore::insert(self.store.as_ref(), &item).await.unwrap();
    }

    /// Self-dry record with an explicit creation time
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
        HistoryLedger::insert(self.store.as_ref(), &record).await.unwrap();
    }

    /// Helper-path record plus the pending order bound to it
    pub async fn pending_pickup(&self, order_id: &str, item_id: &str, created_at: i64) {
        let history_id = format!("his-{}", order_id);
        let record = HistoryRecord::helper(
            history_id.clone(),
            item_id,
            MiteScore::new(80).unwrap(),
            Some(MiteScore::new(20).unwrap()),
            created_at,
        );
        HistoryLedger::insert(self.store.as_ref(), &record).await.unwrap();

        let order = Order::new(order_id, item_id, Some(history_id), created_at);
        OrderStore::insert(self.store.as_ref(), &order).await.unwrap();
    }

    pub async fn load_item(&self, id: &str) -> Item {
        ItemStore::find_by_id(self.store.as_ref(), &id.to_string())
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn load_order(&self, id: &OrderId) -> Order {
        OrderStore::find_by_id(self.store.as_ref(), id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn load_history(&self, id: &HistoryId) -> Option<HistoryRecord> {
        HistoryLedger::find_by_id(self.store.as_ref(), id)
            .await
            .unwrap()
    }
}
