use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use deskd_core::domain::ticket::{Ticket, TicketId, TicketPriority, TicketStatus};
use deskd_core::errors::CapabilityError;
use deskd_db::repositories::TicketRepository;

use crate::capabilities::{AutomationOutcome, AutomationRunner, EscalationNotice, EscalationNotifier};

use super::{Tool, ToolEnvelope, ToolSpec};

fn object_schema(properties: serde_json::Value, required: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Creates a secure upload link through the automation service and attaches
/// an upload widget for the caller's UI.
pub struct UploadLinkTool {
    runner: Arc<dyn AutomationRunner>,
}

impl UploadLinkTool {
    pub fn new(runner: Arc<dyn AutomationRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Tool for UploadLinkTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "generate_upload_link".to_string(),
            description: "Generate a secure, time-limited link the employee can use to \
                          upload files or screenshots."
                .to_string(),
            parameters: object_schema(
                serde_json::json!({
                    "purpose": {
                        "type": "string",
                        "description": "Short description of what will be uploaded"
                    }
                }),
                &[],
            ),
        }
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, CapabilityError> {
        match self.runner.run("generate_upload_link", arguments).await? {
            AutomationOutcome::Completed(url) => Ok(ToolEnvelope::with_widget(
                "Link generated: a secure upload link is ready for the employee.",
                "upload_widget",
                serde_json::json!({ "url": url }),
            )
            .to_json()),
            AutomationOutcome::TimedOut => Ok(
                "The upload link job did not complete in time; no link is available yet."
                    .to_string(),
            ),
        }
    }
}

/// Fetches recent device activity logs through the automation service.
pub struct ActivityLogsTool {
    runner: Arc<dyn AutomationRunner>,
}

impl ActivityLogsTool {
    pub fn new(runner: Arc<dyn AutomationRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Tool for ActivityLogsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_activity_logs".to_string(),
            description: "Fetch recent activity logs for the employee's device or account."
                .to_string(),
            parameters: object_schema(
                serde_json::json!({
                    "scope": {
                        "type": "string",
                        "description": "What to audit, e.g. 'device' or 'account'"
                    }
                }),
                &[],
            ),
        }
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, CapabilityError> {
        match self.runner.run("get_activity_logs", arguments).await? {
            AutomationOutcome::Completed(logs) => Ok(logs),
            AutomationOutcome::TimedOut => Ok(
                "The activity log export did not complete in time; partial data is not available."
                    .to_string(),
            ),
        }
    }
}

/// Remote restart of a stuck service or device.
pub struct SelfHealRestartTool {
    runner: Arc<dyn AutomationRunner>,
}

impl SelfHealRestartTool {
    pub fn new(runner: Arc<dyn AutomationRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Tool for SelfHealRestartTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "self_heal_restart".to_string(),
            description: "Remotely restart a stuck service or the employee's device. Use \
                          only when the employee reports something frozen or unresponsive."
                .to_string(),
            parameters: object_schema(
                serde_json::json!({
                    "target": {
                        "type": "string",
                        "description": "Service or device to restart"
                    }
                }),
                &[],
            ),
        }
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, CapabilityError> {
        match self.runner.run("self_heal_restart", arguments).await? {
            AutomationOutcome::Completed(detail) => {
                Ok(format!("I have executed the restart. {detail}"))
            }
            AutomationOutcome::TimedOut => Ok(
                "The restart was triggered but did not confirm completion in time. It may \
                 still finish on its own; escalate if the problem persists."
                    .to_string(),
            ),
        }
    }
}

/// Opens a ticket for the human support team and pings the escalation
/// webhook. Ticket persistence takes priority over the notification: a dead
/// webhook still leaves a ticket behind, and a failed full write falls back
/// to one minimal-record attempt before the tool reports failure.
pub struct EscalateToHumanTool {
    tickets: Arc<dyn TicketRepository>,
    notifier: Arc<dyn EscalationNotifier>,
    user_id: String,
    conversation_id: String,
}

impl EscalateToHumanTool {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        notifier: Arc<dyn EscalationNotifier>,
        user_id: impl Into<String>,
        conversation_id: impl Into<String>,
    ) -> Self {
        Self {
            tickets,
            notifier,
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
        }
    }

    fn minimal_ticket(&self, ticket_id: &TicketId) -> Ticket {
        Ticket {
            id: ticket_id.clone(),
            user_id: self.user_id.clone(),
            conversation_id: self.conversation_id.clone(),
            summary: "Escalation requested".to_string(),
            detail: String::new(),
            priority: TicketPriority::Medium,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        }
    }
}

fn parse_priority(arguments: &serde_json::Value) -> TicketPriority {
    match arguments.get("priority").and_then(|v| v.as_str()) {
        Some("low") => TicketPriority::Low,
        Some("high") => TicketPriority::High,
        Some("critical") => TicketPriority::Critical,
        _ => TicketPriority::Medium,
    }
}

#[async_trait]
impl Tool for EscalateToHumanTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "escalate_to_human".to_string(),
            description: "Open a support ticket and alert the human support team. Use when \
                          the employee asks for a person or the issue cannot be resolved \
                          with the other tools."
                .to_string(),
            parameters: object_schema(
                serde_json::json!({
                    "summary": {
                        "type": "string",
                        "description": "One-line summary of the issue"
                    },
                    "detail": {
                        "type": "string",
                        "description": "Context the human agent needs"
                    },
                    "priority": {
                        "type": "string",
                        "enum": ["low", "medium", "high", "critical"]
                    }
                }),
                &["summary"],
            ),
        }
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, CapabilityError> {
        let ticket_id = TicketId(format!("TKT-{}", Uuid::new_v4()));
        let summary = arguments
            .get("summary")
            .and_then(|v| v.as_str())
            .unwrap_or("Escalation requested")
            .to_string();
        let detail =
            arguments.get("detail").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let priority = parse_priority(arguments);

        let ticket = Ticket {
            id: ticket_id.clone(),
            user_id: self.user_id.clone(),
            conversation_id: self.conversation_id.clone(),
            summary: summary.clone(),
            detail,
            priority,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        };

        if let Err(error) = self.tickets.create(ticket).await {
            tracing::error!(
                event_name = "agent.tool.ticket_write_failed",
                ticket_id = %ticket_id,
                error = %error,
                "full ticket write failed, attempting minimal record"
            );
            if let Err(fallback_error) = self.tickets.create(self.minimal_ticket(&ticket_id)).await
            {
                tracing::error!(
                    event_name = "agent.tool.ticket_fallback_failed",
                    ticket_id = %ticket_id,
                    error = %fallback_error,
                    "minimal ticket record also failed"
                );
                return Ok("The escalation could not be recorded right now. Please ask the \
                           employee to contact support directly."
                    .to_string());
            }
        }

        let notice = EscalationNotice {
            ticket_id: ticket_id.0.clone(),
            user_id: self.user_id.clone(),
            summary,
            priority: priority.as_str().to_string(),
        };
        if let Err(error) = self.notifier.notify(&notice).await {
            tracing::warn!(
                event_name = "agent.tool.escalation_notify_failed",
                ticket_id = %ticket_id,
                error = %error,
                "escalation webhook failed, ticket still recorded"
            );
        }

        Ok(ToolEnvelope::with_widget(
            format!(
                "Escalation completed. Ticket created with id {ticket_id}; a human agent \
                 will follow up."
            ),
            "ticket_created",
            serde_json::json!({
                "ticket_id": ticket_id.0,
                "priority": priority.as_str(),
            }),
        )
        .to_json())
    }
}
