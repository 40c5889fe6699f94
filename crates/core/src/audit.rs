use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::risk::RiskLevel;

/// Request and response bodies are truncated to this length before they are
/// written to the ledger.
const CONTENT_TRUNCATE_LEN: usize = 1000;

const AUDIT_SCHEMA_VERSION: &str = "2.0";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyOutcome {
    Pass,
    Blocked,
}

impl SafetyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Blocked => "BLOCKED",
        }
    }
}

/// Immutable record of one processed message, forwarded to the audit sink
/// exactly once, after response composition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: String,
    pub user_id: String,
    pub conversation_id: String,
    pub request_content: String,
    pub response_summary: String,
    pub risk_level: RiskLevel,
    pub actions: Vec<String>,
    pub safety_outcome: SafetyOutcome,
    pub schema_version: String,
    pub occurred_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        user_id: impl Into<String>,
        conversation_id: impl Into<String>,
        request_content: &str,
        response_summary: &str,
        risk_level: RiskLevel,
        actions: Vec<String>,
        safety_outcome: SafetyOutcome,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            conversation_id: conversation_id.into(),
            request_content: truncate(request_content),
            response_summary: truncate(response_summary),
            risk_level,
            actions,
            safety_outcome,
            schema_version: AUDIT_SCHEMA_VERSION.to_string(),
            occurred_at: Utc::now(),
        }
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= CONTENT_TRUNCATE_LEN {
        return text.to_string();
    }
    let mut cut = CONTENT_TRUNCATE_LEN;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text[..cut].to_string()
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, record: AuditRecord);
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl InMemoryAuditSink {
    pub fn records(&self) -> Vec<AuditRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, record: AuditRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditRecord, AuditSink, InMemoryAuditSink, SafetyOutcome};
    use crate::domain::risk::RiskLevel;

    #[test]
    fn in_memory_sink_records_in_order() {
        let sink = InMemoryAuditSink::default();
        sink.emit(AuditRecord::new(
            "emp-1",
            "conv-1",
            "my laptop is frozen",
            "restart scheduled",
            RiskLevel::Medium,
            vec!["Contextual Analysis".to_string()],
            SafetyOutcome::Pass,
        ));
        sink.emit(AuditRecord::new(
            "emp-1",
            "conv-1",
            "thanks",
            "you are welcome",
            RiskLevel::Low,
            vec!["Contextual Analysis".to_string()],
            SafetyOutcome::Pass,
        ));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].request_content, "my laptop is frozen");
        assert_eq!(records[1].safety_outcome, SafetyOutcome::Pass);
    }

    #[test]
    fn long_content_is_truncated() {
        let long = "x".repeat(5000);
        let record = AuditRecord::new(
            "emp-2",
            "conv-2",
            &long,
            &long,
            RiskLevel::Low,
            Vec::new(),
            SafetyOutcome::Pass,
        );
        assert_eq!(record.request_content.len(), 1000);
        assert_eq!(record.response_summary.len(), 1000);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(2000);
        let record = AuditRecord::new(
            "emp-3",
            "conv-3",
            &long,
            "ok",
            RiskLevel::Low,
            Vec::new(),
            SafetyOutcome::Pass,
        );
        assert!(record.request_content.len() <= 1000);
        assert!(record.request_content.chars().all(|c| c == 'é'));
    }
}
