// Order Domain Model (helper-assisted service request)

use crate::domain::error::{DomainError, Result};
use crate::domain::history::HistoryId;
use crate::domain::item::{ItemId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order ID
pub type OrderId = String;

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Non-terminal statuses; at most one order per item may hold one of these
    pub const ACTIVE: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::InProgress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses are immutable once set
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (Pending, Accepted) | (Accepted, InProgress) => true,
            // Any active order may be completed explicitly or cancelled
            (_, Completed) | (_, Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::UnknownStatus(s.to_string()))
    }
}

/// Order entity, bound to exactly one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub item_id: ItemId,
    pub status: OrderStatus,
    pub created_at: i64, // epoch ms
    pub updated_at: i64,
    pub service_user_id: Option<UserId>, // set on accept
    pub history_id: Option<HistoryId>,   // helper-path drying record
}

impl Order {
    /// Create a new `Pending` order
    pub fn new(
        id: impl Into<String>,
        item_id: impl Into<String>,
        history_id: Option<HistoryId>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            item_id: item_id.into(),
            status: OrderStatus::Pending,
            created_at,
            updated_at: created_at,
            service_user_id: None,
            history_id,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Move to `next` if allowed
    pub fn transition(&mut self, next: OrderStatus, now_millis: i64) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidOrderTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = now_millis;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses_are_immutable() {
        for terminal in [OrderStatus::Completed, OrderStatus::Cancelled] {
            for next in OrderStatus::ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_order_progression() {
        let mut order = Order::new("order-1", "item-1", None, 1_000);
        assert_eq!(order.status, OrderStatus::Pending);

        // Cannot skip acceptance
        assert!(order.transition(OrderStatus::InProgress, 2_000).is_err());

        order.transition(OrderStatus::Accepted, 2_000).unwrap();
        order.transition(OrderStatus::InProgress, 3_000).unwrap();
        order.transition(OrderStatus::Completed, 4_000).unwrap();
        assert!(!order.is_active());
        assert!(order.transition(OrderStatus::Cancelled, 5_000).is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "in_progress".parse::<OrderStatus>().unwrap(),
            OrderStatus::InProgress
        );
        assert!("done".parse::<OrderStatus>().is_err());
    }
}
