// Owner notification (best-effort side channel)

use crate::domain::{Item, MiteScore};
use crate::port::{NotificationKind, NotificationPayload, Notifier, UserDirectory};
use std::sync::Arc;
use tracing::{debug, warn};

/// Looks up the item owner and hands the message to the notifier.
///
/// Every failure comes back as a message naming the item. Callers append it
/// to their error list; it never touches state already committed.
#[derive(Clone)]
pub struct OwnerNotifier {
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl OwnerNotifier {
    pub fn new(users: Arc<dyn UserDirectory>, notifier: Arc<dyn Notifier>) -> Self {
        Self { users, notifier }
    }

    pub async fn notify(
        &self,
        item: &Item,
        kind: NotificationKind,
        mite_score: Option<MiteScore>,
        occurred_at: i64,
    ) -> Result<(), String> {
        let contact = match self.users.get_user_by_id(&item.owner_id).await {
            Ok(Some(contact)) => contact,
            Ok(None) => {
                return Err(format!(
                    "item {}: {} notification skipped, owner {} not found",
                    item.id, kind, item.owner_id
                ))
            }
            Err(e) => {
                return Err(format!(
                    "item {}: {} notification skipped, owner lookup failed: {}",
                    item.id, kind, e
                ))
            }
        };

        let payload = NotificationPayload {
            item_id: item.id.clone(),
            recipient_email: contact.email,
            recipient_name: contact.display_name,
            mite_score: mite_score.map(|s| s.value()),
            occurred_at,
        };

        if self.notifier.send(kind, &payload).await {
            debug!(item_id = %item.id, kind = %kind, "Owner notified");
            Ok(())
        } else {
            warn!(item_id = %item.id, kind = %kind, "Owner notification failed");
            Err(format!("item {}: {} notification failed", item.id, kind))
        }
    }
}
