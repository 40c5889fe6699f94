use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority assigned when a conversation is escalated to a human agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

/// Escalation ticket handed to a human support agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: String,
    pub conversation_id: String,
    pub summary: String,
    pub detail: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{TicketPriority, TicketStatus};

    #[test]
    fn priority_serializes_lowercase() {
        let json = serde_json::to_string(&TicketPriority::High).expect("serialize");
        assert_eq!(json, "\"high\"");
    }

    #[test]
    fn status_round_trips() {
        let json = serde_json::to_string(&TicketStatus::InProgress).expect("serialize");
        let parsed: TicketStatus = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, TicketStatus::InProgress);
    }
}
