// Order Store Port (Interface)

use crate::domain::{ItemId, Order, OrderId, OrderStatus, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// Helper-assisted service requests
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Find order by ID
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>>;

    /// `pending` orders for the given items, newest first
    async fn select_pending_for_items(&self, item_ids: &[ItemId]) -> Result<Vec<Order>>;

    /// The non-terminal order for an item, if any
    async fn find_active_for_item(&self, item_id: &ItemId) -> Result<Option<Order>>;

    /// Compare-and-set status update (never leaves a terminal status)
    async fn transition_status(
        &self,
        id: &OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<bool>;

    /// `pending -> accepted`, recording the helper
    async fn accept(&self, id: &OrderId, service_user_id: &UserId) -> Result<bool>;

    /// Count non-terminal orders
    async fn count_active(&self) -> Result<i64>;
}
