// Item Status Store Port (Interface)

use crate::domain::{Item, ItemId, ItemStatus, MiteScore};
use crate::error::Result;
use async_trait::async_trait;

/// Single source of truth for item status and mite score
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a new item
    async fn insert(&self, item: &Item) -> Result<()>;

    /// Find item by ID
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>>;

    /// All items whose status is one of `statuses`
    async fn select_by_status(&self, statuses: &[ItemStatus]) -> Result<Vec<Item>>;

    /// Compare-and-set status update.
    ///
    /// Writes only while the stored status still equals `expected`; returns
    /// false when another writer got there first. Overlapping sweep runs rely
    /// on this to make their second write a no-op.
    async fn transition_status(
        &self,
        id: &ItemId,
        expected: ItemStatus,
        next: ItemStatus,
    ) -> Result<bool>;

    /// Overwrite the mite score
    async fn update_mite_score(&self, id: &ItemId, score: MiteScore) -> Result<()>;

    /// Count items by status
    async fn count_by_status(&self, status: ItemStatus) -> Result<i64>;
}
