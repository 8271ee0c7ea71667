// SQLite Transaction Implementation

use crate::error::map_sqlx_error;
use crate::queries;
use async_trait::async_trait;
use futon_core::domain::{
    HistoryId, HistoryRecord, Item, ItemId, ItemStatus, MiteScore, Order, OrderId, OrderStatus,
};
use futon_core::error::{AppError, Result};
use futon_core::port::{DryingTransaction, TimeProvider, Transaction};
use sqlx::{Sqlite, Transaction as SqlxTransaction};
use std::sync::Arc;

/// Dropping without commit rolls back
pub struct SqliteDryingTransaction<'a> {
    tx: SqlxTransaction<'a, Sqlite>,
    time_provider: Arc<dyn TimeProvider>,
}

impl<'a> SqliteDryingTransaction<'a> {
    pub fn new(tx: SqlxTransaction<'a, Sqlite>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { tx, time_provider }
    }
}

#[async_trait]
impl Transaction for SqliteDryingTransaction<'_> {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl DryingTransaction for SqliteDryingTransaction<'_> {
    async fn find_item(&mut self, id: &ItemId) -> Result<Option<Item>> {
        queries::find_item(&mut *self.tx, id).await
    }

    async fn find_order(&mut self, id: &OrderId) -> Result<Option<Order>> {
        queries::find_order(&mut *self.tx, id).await
    }

    async fn find_active_order_for_item(&mut self, item_id: &ItemId) -> Result<Option<Order>> {
        queries::find_active_order(&mut *self.tx, item_id).await
    }

    async fn find_history(&mut self, id: &HistoryId) -> Result<Option<HistoryRecord>> {
        queries::find_history(&mut *self.tx, id).await
    }

    async fn insert_history(&mut self, record: &HistoryRecord) -> Result<()> {
        queries::insert_history(&mut *self.tx, record).await
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        queries::insert_order(&mut *self.tx, order).await
    }

    async fn transition_item(
        &mut self,
        id: &ItemId,
        expected: ItemStatus,
        next: ItemStatus,
    ) -> Result<bool> {
        let now = self.time_provider.now_millis();
        queries::transition_item(&mut *self.tx, id, expected, next, now).await
    }

    async fn transition_order(
        &mut self,
        id: &OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool> {
        let now = self.time_provider.now_millis();
        queries::transition_order(&mut *self.tx, id, expected, next, now).await
    }

    async fn update_mite_score(&mut self, id: &ItemId, score: MiteScore) -> Result<()> {
        let now = self.time_provider.now_millis();
        match queries::update_mite_score(&mut *self.tx, id, score, now).await? {
            0 => Err(AppError::NotFound(format!("Item {} not found", id))),
            _ => Ok(()),
        }
    }

    async fn complete_order(&mut self, id: &OrderId) -> Result<bool> {
        let now = self.time_provider.now_millis();
        queries::complete_order(&mut *self.tx, id, now).await
    }

    async fn mark_history_completed(&mut self, id: &HistoryId) -> Result<bool> {
        queries::complete_history(&mut *self.tx, id).await
    }

    async fn delete_incomplete_histories(&mut self, item_id: &ItemId) -> Result<u64> {
        queries::delete_incomplete_histories(&mut *self.tx, item_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, SqliteDryingStore};
    use futon_core::port::time_provider::mocks::FixedTimeProvider;
    use futon_core::port::{ItemStore, TransactionalDryingStore};

    async fn setup() -> SqliteDryingStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = SqliteDryingStore::new(pool, Arc::new(FixedTimeProvider::new(1_000)));
        let item = Item::new("item-1", "owner-1", MiteScore::new(60).unwrap(), 1_000);
        ItemStore::insert(&store, &item).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_commit_persists() {
        let store = setup().await;
        let id = "item-1".to_string();

        let mut tx = store.begin_transaction().await.unwrap();
        assert!(tx
            .transition_item(&id, ItemStatus::Normal, ItemStatus::WaitingPickup)
            .await
            .unwrap());
        tx.update_mite_score(&id, MiteScore::new(5).unwrap())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let item = ItemStore::find_by_id(&store, &id).await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::WaitingPickup);
        assert_eq!(item.mite_score.value(), 5);
    }

    #[tokio::test]
    async fn test_rollback_discards() {
        let store = setup().await;
        let id = "item-1".to_string();

        let mut tx = store.begin_transaction().await.unwrap();
        tx.transition_item(&id, ItemStatus::Normal, ItemStatus::WaitingPickup)
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let item = ItemStore::find_by_id(&store, &id).await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::Normal);
    }

    #[tokio::test]
    async fn test_complete_order_only_from_active() {
        let store = setup().await;
        let mut tx = store.begin_transaction().await.unwrap();
        let mut order = Order::new("ord-1", "item-1", None, 1_000);
        order.status = OrderStatus::Cancelled;
        tx.insert_order(&order).await.unwrap();

        assert!(!tx.complete_order(&order.id).await.unwrap());
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_rollback_restores_cancelled_order_and_history() {
        let store = setup().await;
        let item_id = "item-1".to_string();
        let order = Order::new("ord-1", "item-1", None, 1_000);
        let record = HistoryRecord::helper(
            "his-1",
            "item-1",
            MiteScore::new(60).unwrap(),
            None,
            1_000,
        );
        let mut tx = store.begin_transaction().await.unwrap();
        tx.transition_item(&item_id, ItemStatus::Normal, ItemStatus::WaitingPickup)
            .await
            .unwrap();
        tx.insert_order(&order).await.unwrap();
        tx.insert_history(&record).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        assert!(tx
            .transition_order(&order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap());
        assert_eq!(tx.delete_incomplete_histories(&item_id).await.unwrap(), 1);
        tx.rollback().await.unwrap();

        let mut tx = store.begin_transaction().await.unwrap();
        let order = tx.find_order(&order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(tx.find_history(&record.id).await.unwrap().is_some());
        assert!(!tx
            .transition_order(&order.id, OrderStatus::Cancelled, OrderStatus::Pending)
            .await
            .unwrap());
        tx.rollback().await.unwrap();
    }
}
