// SQLite store implementing the item, order and history ports

use crate::error::map_sqlx_error;
use crate::queries;
use crate::transaction::SqliteDryingTransaction;
use async_trait::async_trait;
use futon_core::domain::{
    HistoryFilter, HistoryId, HistoryRecord, Item, ItemId, ItemStatus, MiteScore, Order, OrderId,
    OrderStatus, UserId,
};
use futon_core::error::{AppError, Result};
use futon_core::port::{
    DryingTransaction, HistoryLedger, ItemStore, OrderStore, TimeProvider, TransactionalDryingStore,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// One pool, every drying store port
#[derive(Clone)]
pub struct SqliteDryingStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteDryingStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ItemStore for SqliteDryingStore {
    async fn insert(&self, item: &Item) -> Result<()> {
        queries::insert_item(&self.pool, item).await
    }

    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>> {
        queries::find_item(&self.pool, id).await
    }

    async fn select_by_status(&self, statuses: &[ItemStatus]) -> Result<Vec<Item>> {
        queries::select_items_by_status(&self.pool, statuses).await
    }

    async fn transition_status(
        &self,
        id: &ItemId,
        expected: ItemStatus,
        next: ItemStatus,
    ) -> Result<bool> {
        let now = self.time_provider.now_millis();
        let applied = queries::transition_item(&self.pool, id, expected, next, now).await?;
        if !applied {
            debug!(item_id = %id, expected = %expected, next = %next, "Item CAS missed");
        }
        Ok(applied)
    }

    async fn update_mite_score(&self, id: &ItemId, score: MiteScore) -> Result<()> {
        let now = self.time_provider.now_millis();
        match queries::update_mite_score(&self.pool, id, score, now).await? {
            0 => Err(AppError::NotFound(format!("Item {} not found", id))),
            _ => Ok(()),
        }
    }

    async fn count_by_status(&self, status: ItemStatus) -> Result<i64> {
        queries::count_items_by_status(&self.pool, status).await
    }
}

#[async_trait]
impl OrderStore for SqliteDryingStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        queries::insert_order(&self.pool, order).await
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>> {
        queries::find_order(&self.pool, id).await
    }

    async fn select_pending_for_items(&self, item_ids: &[ItemId]) -> Result<Vec<Order>> {
        queries::select_pending_orders(&self.pool, item_ids).await
    }

    async fn find_active_for_item(&self, item_id: &ItemId) -> Result<Option<Order>> {
        queries::find_active_order(&self.pool, item_id).await
    }

    async fn transition_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool> {
        let now = self.time_provider.now_millis();
        queries::transition_order(&self.pool, id, expected, next, now).await
    }

    async fn accept(&self, id: &OrderId, service_user_id: &UserId) -> Result<bool> {
        let now = self.time_provider.now_millis();
        queries::accept_order(&self.pool, id, service_user_id, now).await
    }

    async fn count_active(&self) -> Result<i64> {
        queries::count_active_orders(&self.pool).await
    }
}

#[async_trait]
impl HistoryLedger for SqliteDryingStore {
    async fn insert(&self, record: &HistoryRecord) -> Result<()> {
        queries::insert_history(&self.pool, record).await
    }

    async fn find_by_id(&self, id: &HistoryId) -> Result<Option<HistoryRecord>> {
        queries::find_history(&self.pool, id).await
    }

    async fn select_latest_for_items(
        &self,
        item_ids: &[ItemId],
        filter: HistoryFilter,
    ) -> Result<Vec<HistoryRecord>> {
        queries::select_histories(&self.pool, item_ids, filter).await
    }

    async fn mark_completed(&self, id: &HistoryId) -> Result<bool> {
        queries::complete_history(&self.pool, id).await
    }

    async fn delete_incomplete_for_item(&self, item_id: &ItemId) -> Result<u64> {
        queries::delete_incomplete_histories(&self.pool, item_id).await
    }
}

#[async_trait]
impl TransactionalDryingStore for SqliteDryingStore {
    async fn begin_transaction(&self) -> Result<Box<dyn DryingTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteDryingTransaction::new(
            tx,
            Arc::clone(&self.time_provider),
        )))
    }
}
