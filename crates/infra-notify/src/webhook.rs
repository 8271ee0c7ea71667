// Webhook notifier: POSTs each notification as JSON

use async_trait::async_trait;
use futon_core::error::{AppError, Result};
use futon_core::port::{NotificationKind, NotificationPayload, Notifier};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-request timeout; a slow receiver must not stall a sweep
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct WebhookBody<'a> {
    kind: NotificationKind,
    #[serde(flatten)]
    payload: &'a NotificationPayload,
}

/// Sends notifications to an HTTP endpoint
///
/// Any transport error or non-2xx status is logged and reported as `false`.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build webhook client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, kind: NotificationKind, payload: &NotificationPayload) -> bool {
        let body = WebhookBody { kind, payload };

        match self.client.post(&self.url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(kind = %kind, item_id = %payload.item_id, "Webhook delivered");
                true
            }
            Ok(response) => {
                warn!(
                    kind = %kind,
                    item_id = %payload.item_id,
                    status = response.status().as_u16(),
                    "Webhook rejected notification"
                );
                false
            }
            Err(e) => {
                warn!(kind = %kind, item_id = %payload.item_id, error = %e, "Webhook unreachable");
                false
            }
        }
    }
}
