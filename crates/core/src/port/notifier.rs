// Notification Sender Port (best-effort side channel)

use crate::domain::ItemId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification kinds emitted by the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    WindowStarted,
    WindowEnded,
    PickupTimedOut,
    OrderAccepted,
    OrderCompleted,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::WindowStarted => "window_started",
            NotificationKind::WindowEnded => "window_ended",
            NotificationKind::PickupTimedOut => "pickup_timed_out",
            NotificationKind::OrderAccepted => "order_accepted",
            NotificationKind::OrderCompleted => "order_completed",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the owner is told
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub item_id: ItemId,
    pub recipient_email: String,
    pub recipient_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mite_score: Option<u8>,
    pub occurred_at: i64,
}

/// Notification sender
///
/// Never fails past the core: delivery problems are reported as `false`
/// and logged by the implementation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, kind: NotificationKind, payload: &NotificationPayload) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Records every send; can be switched to always fail
    pub struct MockNotifier {
        succeed: AtomicBool,
        sent: Mutex<Vec<(NotificationKind, NotificationPayload)>>,
    }

    impl MockNotifier {
        pub fn new_success() -> Self {
            Self {
                succeed: AtomicBool::new(true),
                sent: Mutex::new(Vec::new()),
            }
        }

        pub fn new_failing() -> Self {
            let notifier = Self::new_success();
            notifier.succeed.store(false, Ordering::SeqCst);
            notifier
        }

        /// Attempts, including failed ones
        pub fn sent(&self) -> Vec<(NotificationKind, NotificationPayload)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn count(&self, kind: NotificationKind) -> usize {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _)| *k == kind)
                .count()
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, kind: NotificationKind, payload: &NotificationPayload) -> bool {
            self.sent.lock().unwrap().push((kind, payload.clone()));
            self.succeed.load(Ordering::SeqCst)
        }
    }
}
