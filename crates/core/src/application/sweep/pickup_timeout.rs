// Pickup timeout sweep (helper path)

use super::{SweepEngine, SweepKind, SweepReport, SweepTally};
use crate::domain::{Item, ItemId, ItemStatus, Order, OrderStatus, SweepClock};
use crate::error::Result;
use crate::port::NotificationKind;
use std::collections::HashMap;
use tracing::{debug, info};

impl SweepEngine {
    pub(super) async fn pickup_timeout_pass(&self, clock: SweepClock) -> Result<SweepReport> {
        let kind = SweepKind::PickupTimeout;

        let items = self
            .stores
            .items
            .select_by_status(&[ItemStatus::WaitingPickup])
            .await?;
        if items.is_empty() {
            return Ok(SweepReport::empty(kind, "No items waiting for pickup"));
        }

        let ids: Vec<ItemId> = items.iter().map(|i| i.id.clone()).collect();
        let pending = self.stores.orders.select_pending_for_items(&ids).await?;
        if pending.is_empty() {
            return Ok(SweepReport::empty(kind, "No pending orders"));
        }

        let by_id: HashMap<ItemId, Item> = items.into_iter().map(|i| (i.id.clone(), i)).collect();
        let mut tally = SweepTally::default();

        for order in pending {
            let Some(item) = by_id.get(&order.item_id) else {
                continue;
            };
            tally.processed += 1;

            if !clock.grace_expired(order.created_at, self.config.pickup_grace_ms) {
                debug!(order_id = %order.id, item_id = %item.id, "Pickup grace not expired");
                continue;
            }

            if self.expire_pickup(item, &order, &mut tally).await {
                let outcome = self
                    .owner_notifier
                    .notify(item, NotificationKind::PickupTimedOut, None, clock.now())
                    .await;
                tally.record_notification(outcome);
            }
        }

        Ok(tally.finish(kind))
    }

    /// Cancel the order, revert the item and drop its never-started history.
    ///
    /// Returns true when this call committed the revert. A failed step leaves
    /// both the order and the item as they were, so the next sweep retries.
    async fn expire_pickup(&self, item: &Item, order: &Order, tally: &mut SweepTally) -> bool {
        match self.cancel_pickup(item, order).await {
            Ok(Some(deleted)) => {
                tally.updated += 1;
                tally.deleted += deleted as usize;
                info!(item_id = %item.id, order_id = %order.id, "Pickup timed out");
                true
            }
            Ok(None) => false,
            Err(e) => {
                tally.record_error(format!(
                    "item {}: failed to expire order {}: {}",
                    item.id, order.id, e
                ));
                false
            }
        }
    }

    /// One transaction; `None` when a concurrent writer moved the order or
    /// the item first
    async fn cancel_pickup(&self, item: &Item, order: &Order) -> Result<Option<u64>> {
        let mut tx = self.stores.transactions.begin_transaction().await?;

        // The order CAS claims the work; a helper accepting concurrently wins
        if !tx
            .transition_order(&order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await?
        {
            debug!(order_id = %order.id, "Order left pending, skipping");
            tx.rollback().await?;
            return Ok(None);
        }

        if !tx
            .transition_item(&item.id, ItemStatus::WaitingPickup, ItemStatus::Normal)
            .await?
        {
            debug!(item_id = %item.id, order_id = %order.id, "Item left waiting_pickup, skipping");
            tx.rollback().await?;
            return Ok(None);
        }

        let deleted = tx.delete_incomplete_histories(&item.id).await?;
        tx.commit().await?;
        Ok(Some(deleted))
    }
}
