use std::collections::HashMap;

use tokio::sync::RwLock;

use deskd_core::audit::AuditRecord;
use deskd_core::domain::ticket::{Ticket, TicketId};

use super::{AuditLogRepository, RepositoryError, TicketRepository};

#[derive(Default)]
pub struct InMemoryTicketRepository {
    tickets: RwLock<HashMap<String, Ticket>>,
}

#[async_trait::async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn create(&self, ticket: Ticket) -> Result<(), RepositoryError> {
        let mut tickets = self.tickets.write().await;
        tickets.entry(ticket.id.0.clone()).or_insert(ticket);
        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError> {
        let tickets = self.tickets.read().await;
        Ok(tickets.get(&id.0).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Ticket>, RepositoryError> {
        let tickets = self.tickets.read().await;
        let mut matching: Vec<Ticket> =
            tickets.values().filter(|t| t.user_id == user_id).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}

#[derive(Default)]
pub struct InMemoryAuditLogRepository {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditLogRepository {
    pub async fn all(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait::async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn append(&self, record: &AuditRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        if !records.iter().any(|r| r.record_id == record.record_id) {
            records.push(record.clone());
        }
        Ok(())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<AuditRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.conversation_id == conversation_id).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use deskd_core::audit::{AuditRecord, SafetyOutcome};
    use deskd_core::domain::risk::RiskLevel;
    use deskd_core::domain::ticket::{Ticket, TicketId, TicketPriority, TicketStatus};

    use crate::repositories::{
        AuditLogRepository, InMemoryAuditLogRepository, InMemoryTicketRepository, TicketRepository,
    };

    fn sample_ticket(id: &str) -> Ticket {
        Ticket {
            id: TicketId(id.to_string()),
            user_id: "emp-1".to_string(),
            conversation_id: "conv-1".to_string(),
            summary: "Printer offline".to_string(),
            detail: "Third floor printer does not respond".to_string(),
            priority: TicketPriority::Medium,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn in_memory_ticket_repo_keeps_first_write() {
        let repo = InMemoryTicketRepository::default();

        let first = sample_ticket("TKT-1");
        repo.create(first.clone()).await.expect("create");

        let mut replay = first.clone();
        replay.summary = "changed".to_string();
        repo.create(replay).await.expect("replay");

        let found = repo
            .find_by_id(&TicketId("TKT-1".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(found.summary, first.summary);
    }

    #[tokio::test]
    async fn in_memory_audit_log_deduplicates_by_record_id() {
        let repo = InMemoryAuditLogRepository::default();
        let record = AuditRecord::new(
            "emp-1",
            "conv-1",
            "hello",
            "hi there",
            RiskLevel::Low,
            Vec::new(),
            SafetyOutcome::Pass,
        );

        repo.append(&record).await.expect("append");
        repo.append(&record).await.expect("retry");

        assert_eq!(repo.all().await.len(), 1);
    }
}
