//! Webhook escalation notifier. Posts the escalation notice to the
//! configured webhook; the escalation tool treats notify failures as
//! non-fatal, so this client only reports, never retries.

use async_trait::async_trait;
use reqwest::Client;

use deskd_agent::capabilities::{EscalationNotice, EscalationNotifier};
use deskd_core::errors::CapabilityError;

use crate::http::{build_client, require_success, transport_error};

const NOTIFY_TIMEOUT_SECS: u64 = 10;

pub struct WebhookEscalationNotifier {
    client: Client,
    webhook_url: String,
}

impl WebhookEscalationNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, CapabilityError> {
        Ok(Self { client: build_client(NOTIFY_TIMEOUT_SECS)?, webhook_url: webhook_url.into() })
    }
}

#[async_trait]
impl EscalationNotifier for WebhookEscalationNotifier {
    async fn notify(&self, notice: &EscalationNotice) -> Result<(), CapabilityError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(notice)
            .send()
            .await
            .map_err(transport_error)?;
        require_success(response)?;

        tracing::info!(
            event_name = "capability.escalation.notified",
            ticket_id = %notice.ticket_id,
            priority = %notice.priority,
            "escalation webhook delivered"
        );
        Ok(())
    }
}
