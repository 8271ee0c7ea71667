// Helper pickup use cases: request, accept, start

use crate::application::notify::OwnerNotifier;
use crate::domain::{HistoryRecord, ItemId, ItemStatus, MiteScore, Order, OrderId, OrderStatus, UserId};
use crate::error::{AppError, Result};
use crate::port::{
    IdProvider, ItemStore, NotificationKind, OrderStore, RecordKind, TimeProvider,
    TransactionalDryingStore,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Pickup request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPickupRequest {
    pub item_id: ItemId,
    #[serde(default)]
    pub predicted_score: Option<i64>,
}

/// Execute request-pickup use case (with transaction for atomicity)
///
/// Inserts a helper history record and a `pending` order bound to it, then
/// moves the item `normal -> waiting_pickup`.
pub async fn request(
    store: &dyn TransactionalDryingStore,
    id_provider: &dyn IdProvider,
    time_provider: &dyn TimeProvider,
    req: RequestPickupRequest,
) -> Result<Order> {
    let predicted = req.predicted_score.map(MiteScore::new).transpose()?;

    let mut tx = store.begin_transaction().await?;

    let item = tx
        .find_item(&req.item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Item {} not found", req.item_id)))?;

    if item.status != ItemStatus::Normal {
        tx.rollback().await?;
        return Err(AppError::InvalidState(format!(
            "Item {} is {}, expected normal",
            item.id, item.status
        )));
    }
    if let Some(active) = tx.find_active_order_for_item(&item.id).await? {
        tx.rollback().await?;
        return Err(AppError::Conflict(format!(
            "Item {} already has active order {}",
            item.id, active.id
        )));
    }

    let now = time_provider.now_millis();
    let record = HistoryRecord::helper(
        id_provider.generate_id(RecordKind::History),
        item.id.clone(),
        item.mite_score,
        predicted,
        now,
    );
    let order = Order::new(
        id_provider.generate_id(RecordKind::Order),
        item.id.clone(),
        Some(record.id.clone()),
        now,
    );

    tx.insert_history(&record).await?;
    tx.insert_order(&order).await?;

    if !tx
        .transition_item(&item.id, ItemStatus::Normal, ItemStatus::WaitingPickup)
        .await?
    {
        tx.rollback().await?;
        return Err(AppError::Conflict(format!(
            "Item {} changed status concurrently",
            item.id
        )));
    }

    tx.commit().await?;

    info!(order_id = %order.id, item_id = %item.id, "Pickup requested");
    Ok(order)
}

async fn load_order(orders: &dyn OrderStore, order_id: &OrderId) -> Result<Order> {
    orders
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", order_id)))
}

fn ensure_transition(order: &Order, next: OrderStatus) -> Result<()> {
    if order.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::InvalidState(format!(
            "Order {} is {}, cannot move to {}",
            order.id, order.status, next
        )))
    }
}

/// Execute accept use case: `pending -> accepted`, owner notified best-effort
pub async fn accept(
    items: &dyn ItemStore,
    orders: &dyn OrderStore,
    owner_notifier: &OwnerNotifier,
    time_provider: &dyn TimeProvider,
    order_id: &OrderId,
    service_user_id: &UserId,
) -> Result<Order> {
    if service_user_id.trim().is_empty() {
        return Err(AppError::Validation(
            "service_user_id cannot be empty".to_string(),
        ));
    }

    let mut order = load_order(orders, order_id).await?;
    ensure_transition(&order, OrderStatus::Accepted)?;

    // CAS: a timeout sweep or another helper may have claimed the order
    if !orders.accept(&order.id, service_user_id).await? {
        return Err(AppError::Conflict(format!(
            "Order {} is no longer pending",
            order.id
        )));
    }

    let now = time_provider.now_millis();
    order.transition(OrderStatus::Accepted, now)?;
    order.service_user_id = Some(service_user_id.clone());

    info!(order_id = %order.id, service_user_id = %service_user_id, "Order accepted");

    match items.find_by_id(&order.item_id).await {
        Ok(Some(item)) => {
            if let Err(message) = owner_notifier
                .notify(&item, NotificationKind::OrderAccepted, None, now)
                .await
            {
                warn!(order_id = %order.id, error = %message, "Acceptance notification failed");
            }
        }
        Ok(None) => warn!(order_id = %order.id, item_id = %order.item_id, "Order item vanished"),
        Err(e) => warn!(order_id = %order.id, error = %e, "Item lookup for notification failed"),
    }

    Ok(order)
}

/// Execute start use case: `accepted -> in_progress`
pub async fn start(
    orders: &dyn OrderStore,
    time_provider: &dyn TimeProvider,
    order_id: &OrderId,
) -> Result<Order> {
    let mut order = load_order(orders, order_id).await?;
    ensure_transition(&order, OrderStatus::InProgress)?;

    if !orders
        .transition_status(&order.id, OrderStatus::Accepted, OrderStatus::InProgress)
        .await?
    {
        return Err(AppError::Conflict(format!(
            "Order {} is no longer accepted",
            order.id
        )));
    }

    order.transition(OrderStatus::InProgress, time_provider.now_millis())?;
    info!(order_id = %order.id, "Order in progress");
    Ok(order)
}
