// Order Completion Use Case (explicit owner/helper action)

use crate::application::notify::OwnerNotifier;
use crate::domain::{HistoryId, ItemId, ItemStatus, OrderId, OrderStatus};
use crate::error::{AppError, Result};
use crate::port::{NotificationKind, TimeProvider, TransactionalDryingStore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of an order completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompletion {
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub order_status: OrderStatus,
    pub item_status: ItemStatus,
    pub history_id: Option<HistoryId>,
    pub mite_score: u8,
    pub mite_score_updated: bool,
    pub notified: bool,
}

/// Execute order completion (with transaction for atomicity)
///
/// Order -> `completed`, item -> `normal`, attached history completed with its
/// predicted score applied. All three commit together; the owner is told
/// afterwards.
pub async fn execute(
    store: &dyn TransactionalDryingStore,
    owner_notifier: &OwnerNotifier,
    time_provider: &dyn TimeProvider,
    order_id: &OrderId,
) -> Result<OrderCompletion> {
    let mut tx = store.begin_transaction().await?;

    let order = tx
        .find_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))?;

    if !tx.complete_order(&order.id).await? {
        tx.rollback().await?;
        return Err(AppError::InvalidState(format!(
            "Order {} is already {}",
            order.id, order.status
        )));
    }

    let mut item = tx
        .find_item(&order.item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", order.item_id)))?;

    if item.status != ItemStatus::Normal {
        if !tx
            .transition_item(&item.id, item.status, ItemStatus::Normal)
            .await?
        {
            tx.rollback().await?;
            return Err(AppError::Conflict(format!(
                "Item {} changed status concurrently",
                item.id
            )));
        }
        item.status = ItemStatus::Normal;
    }

    let mut mite_score_updated = false;
    if let Some(history_id) = &order.history_id {
        match tx.find_history(history_id).await? {
            Some(record) if !record.completed => {
                tx.mark_history_completed(&record.id).await?;
                if let Some(after) = record.after_score {
                    tx.update_mite_score(&item.id, after).await?;
                    item.mite_score = after;
                    mite_score_updated = true;
                }
            }
            Some(_) => {}
            None => warn!(order_id = %order.id, history_id = %history_id, "Attached history missing"),
        }
    }

    tx.commit().await?;

    info!(
        order_id = %order.id,
        item_id = %item.id,
        mite_score = item.mite_score.value(),
        "Order completed"
    );

    let now = time_provider.now_millis();
    let notified = match owner_notifier
        .notify(&item, NotificationKind::OrderCompleted, Some(item.mite_score), now)
        .await
    {
        Ok(()) => true,
        Err(message) => {
            warn!(order_id = %order.id, error = %message, "Completion notification failed");
            false
        }
    };

    Ok(OrderCompletion {
        order_id: order.id,
        item_id: item.id,
        order_status: OrderStatus::Completed,
        item_status: item.status,
        history_id: order.history_id,
        mite_score: item.mite_score.value(),
        mite_score_updated,
        notified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lifecycle::pickup::{self, RequestPickupRequest};
    use crate::domain::{Item, MiteScore};
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::mocks::InMemoryDryingStore;
    use crate::port::notifier::mocks::MockNotifier;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use crate::port::user_directory::mocks::MockUserDirectory;
    use crate::port::ItemStore;
    use std::sync::Arc;

    const NOW: i64 = 1_700_000_000_000;

    async fn setup(notifier: MockNotifier) -> (InMemoryDryingStore, Arc<FixedTimeProvider>, OwnerNotifier, OrderId) {
        let clock = Arc::new(FixedTimeProvider::new(NOW));
        let store = InMemoryDryingStore::new(clock.clone());
        let item = Item::new("item-1", "owner-1", MiteScore::new(90).unwrap(), NOW);
        ItemStore::insert(&store, &item).await.unwrap();

        let order = pickup::request(
            &store,
            &SequentialIdProvider::default(),
            clock.as_ref(),
            RequestPickupRequest {
                item_id: "item-1".to_string(),
                predicted_score: Some(15),
            },
        )
        .await
        .unwrap();

        let users =
            Arc::new(MockUserDirectory::default().with_user("owner-1", "o@example.com", "Owner"));
        let owner_notifier = OwnerNotifier::new(users, Arc::new(notifier));
        (store, clock, owner_notifier, order.id)
    }

    #[tokio::test]
    async fn test_completion_updates_order_item_and_history() {
        let (store, clock, owner_notifier, order_id) = setup(MockNotifier::new_success()).await;

        let done = execute(&store, &owner_notifier, clock.as_ref(), &order_id)
            .await
            .unwrap();

        assert_eq!(done.order_status, OrderStatus::Completed);
        assert_eq!(done.item_status, ItemStatus::Normal);
        assert_eq!(done.mite_score, 15);
        assert!(done.mite_score_updated);
        assert!(done.notified);

        let item = store.item("item-1").unwrap();
        assert_eq!(item.status, ItemStatus::Normal);
        assert_eq!(item.mite_score, MiteScore::new(15).unwrap());
        assert!(store.history(&done.history_id.unwrap()).unwrap().completed);
        assert_eq!(store.order(&order_id).unwrap().status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_completing_terminal_order_fails_without_writes() {
        let (store, clock, owner_notifier, order_id) = setup(MockNotifier::new_success()).await;
        execute(&store, &owner_notifier, clock.as_ref(), &order_id)
            .await
            .unwrap();

        let err = execute(&store, &owner_notifier, clock.as_ref(), &order_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_failed_score_write_rolls_back() {
        let (store, clock, owner_notifier, order_id) = setup(MockNotifier::new_success()).await;
        store.fail_score_writes("item-1");

        assert!(execute(&store, &owner_notifier, clock.as_ref(), &order_id)
            .await
            .is_err());

        assert_eq!(store.order(&order_id).unwrap().status, OrderStatus::Pending);
        assert_eq!(store.item("item-1").unwrap().status, ItemStatus::WaitingPickup);
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_completion() {
        let (store, clock, owner_notifier, order_id) = setup(MockNotifier::new_failing()).await;

        let done = execute(&store, &owner_notifier, clock.as_ref(), &order_id)
            .await
            .unwrap();
        assert!(!done.notified);
        assert_eq!(store.order(&order_id).unwrap().status, OrderStatus::Completed);
    }
}
