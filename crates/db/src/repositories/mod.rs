use async_trait::async_trait;
use thiserror::Error;

use deskd_core::audit::AuditRecord;
use deskd_core::domain::ticket::{Ticket, TicketId};

pub mod audit_log;
pub mod memory;
pub mod ticket;

pub use audit_log::SqlAuditLogRepository;
pub use memory::{InMemoryAuditLogRepository, InMemoryTicketRepository};
pub use ticket::SqlTicketRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Persistence for escalation tickets. `create` is idempotent on ticket id:
/// replaying the same escalation never produces a second ticket.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn create(&self, ticket: Ticket) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Ticket>, RepositoryError>;
}

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, record: &AuditRecord) -> Result<(), RepositoryError>;
    async fn list_for_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<AuditRecord>, RepositoryError>;
}
