// Transaction port for atomic multi-record lifecycle steps

use crate::domain::{
    HistoryId, HistoryRecord, Item, ItemId, ItemStatus, MiteScore, Order, OrderId, OrderStatus,
};
use crate::error::Result;
use async_trait::async_trait;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Stores that can open a unit of work spanning items, orders and history
#[async_trait]
pub trait TransactionalDryingStore: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<Box<dyn DryingTransaction>>;
}

/// Store operations within a transaction
///
/// Used by the lifecycle entry points and by sweep steps that touch more than
/// one record. A step either commits whole or leaves the item as it was.
#[async_trait]
pub trait DryingTransaction: Transaction {
    async fn find_item(&mut self, id: &ItemId) -> Result<Option<Item>>;

    async fn find_order(&mut self, id: &OrderId) -> Result<Option<Order>>;

    async fn find_active_order_for_item(&mut self, item_id: &ItemId) -> Result<Option<Order>>;

    async fn find_history(&mut self, id: &HistoryId) -> Result<Option<HistoryRecord>>;

    async fn insert_history(&mut self, record: &HistoryRecord) -> Result<()>;

    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    /// Compare-and-set item status (within transaction)
    async fn transition_item(
        &mut self,
        id: &ItemId,
        expected: ItemStatus,
        next: ItemStatus,
    ) -> Result<bool>;

    /// Compare-and-set order status; false if `expected` is terminal
    async fn transition_order(
        &mut self,
        id: &OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool>;

    async fn update_mite_score(&mut self, id: &ItemId, score: MiteScore) -> Result<()>;

    /// Any non-terminal status -> `completed`; false if already terminal
    async fn complete_order(&mut self, id: &OrderId) -> Result<bool>;

    async fn mark_history_completed(&mut self, id: &HistoryId) -> Result<bool>;

    /// Drop never-completed records of an item; returns rows removed
    async fn delete_incomplete_histories(&mut self, item_id: &ItemId) -> Result<u64>;
}
