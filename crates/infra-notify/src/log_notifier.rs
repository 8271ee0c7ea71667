// Log-only notifier, used when no webhook is configured

use async_trait::async_trait;
use futon_core::port::{NotificationKind, NotificationPayload, Notifier};
use tracing::info;

/// Writes every notification to the log and always succeeds
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, kind: NotificationKind, payload: &NotificationPayload) -> bool {
        info!(
            kind = %kind,
            item_id = %payload.item_id,
            recipient = %payload.recipient_email,
            mite_score = ?payload.mite_score,
            occurred_at = payload.occurred_at,
            "Notification"
        );
        true
    }
}
