// History Ledger Port (Interface)

use crate::domain::{HistoryFilter, HistoryId, HistoryRecord, ItemId};
use crate::error::Result;
use async_trait::async_trait;

/// Drying attempts per item
#[async_trait]
pub trait HistoryLedger: Send + Sync {
    /// Append a record
    async fn insert(&self, record: &HistoryRecord) -> Result<()>;

    /// Find record by ID
    async fn find_by_id(&self, id: &HistoryId) -> Result<Option<HistoryRecord>>;

    /// Records for the given items matching `filter`, ordered by
    /// `created_at` descending so the first row per item is the latest
    async fn select_latest_for_items(
        &self,
        item_ids: &[ItemId],
        filter: HistoryFilter,
    ) -> Result<Vec<HistoryRecord>>;

    /// Flip `completed` once; false if it was already completed
    async fn mark_completed(&self, id: &HistoryId) -> Result<bool>;

    /// Delete incomplete records of an item (drying never started).
    /// Completed records are never deleted.
    async fn delete_incomplete_for_item(&self, item_id: &ItemId) -> Result<u64>;
}
