use chrono::{DateTime, Utc};
use sqlx::Row;

use deskd_core::domain::ticket::{Ticket, TicketId, TicketPriority, TicketStatus};

use super::{RepositoryError, TicketRepository};
use crate::DbPool;

pub struct SqlTicketRepository {
    pool: DbPool,
}

impl SqlTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_priority(s: &str) -> TicketPriority {
    match s {
        "low" => TicketPriority::Low,
        "high" => TicketPriority::High,
        "critical" => TicketPriority::Critical,
        _ => TicketPriority::Medium,
    }
}

fn parse_status(s: &str) -> TicketStatus {
    match s {
        "in_progress" => TicketStatus::InProgress,
        "resolved" => TicketStatus::Resolved,
        "closed" => TicketStatus::Closed,
        _ => TicketStatus::Open,
    }
}

fn row_to_ticket(row: &sqlx::sqlite::SqliteRow) -> Result<Ticket, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let conversation_id: String =
        row.try_get("conversation_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let summary: String =
        row.try_get("summary").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let detail: String =
        row.try_get("detail").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let priority_str: String =
        row.try_get("priority").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(Ticket {
        id: TicketId(id),
        user_id,
        conversation_id,
        summary,
        detail,
        priority: parse_priority(&priority_str),
        status: parse_status(&status_str),
        created_at,
    })
}

#[async_trait::async_trait]
impl TicketRepository for SqlTicketRepository {
    async fn create(&self, ticket: Ticket) -> Result<(), RepositoryError> {
        // OR IGNORE keeps the first write when an escalation is replayed.
        sqlx::query(
            "INSERT OR IGNORE INTO tickets
                 (id, user_id, conversation_id, summary, detail, priority, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&ticket.id.0)
        .bind(&ticket.user_id)
        .bind(&ticket.conversation_id)
        .bind(&ticket.summary)
        .bind(&ticket.detail)
        .bind(ticket.priority.as_str())
        .bind(ticket.status.as_str())
        .bind(ticket.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &TicketId) -> Result<Option<Ticket>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, conversation_id, summary, detail, priority, status, created_at
             FROM tickets WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_ticket(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Ticket>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, user_id, conversation_id, summary, detail, priority, status, created_at
             FROM tickets WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_ticket).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use deskd_core::domain::ticket::{Ticket, TicketId, TicketPriority, TicketStatus};

    use super::SqlTicketRepository;
    use crate::repositories::TicketRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_ticket(id: &str, user_id: &str) -> Ticket {
        Ticket {
            id: TicketId(id.to_string()),
            user_id: user_id.to_string(),
            conversation_id: "conv-1".to_string(),
            summary: "VPN keeps disconnecting".to_string(),
            detail: "Drops every few minutes since this morning".to_string(),
            priority: TicketPriority::High,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_and_find_by_id() {
        let pool = setup().await;
        let repo = SqlTicketRepository::new(pool);

        let ticket = sample_ticket("TKT-001", "emp-1");
        repo.create(ticket.clone()).await.expect("create");

        let found = repo.find_by_id(&TicketId("TKT-001".to_string())).await.expect("find");
        let found = found.expect("should exist");
        assert_eq!(found.summary, ticket.summary);
        assert_eq!(found.priority, TicketPriority::High);
    }

    #[tokio::test]
    async fn create_is_idempotent_on_id() {
        let pool = setup().await;
        let repo = SqlTicketRepository::new(pool);

        let first = sample_ticket("TKT-001", "emp-1");
        repo.create(first.clone()).await.expect("first create");

        let mut replay = first.clone();
        replay.summary = "different text on replay".to_string();
        repo.create(replay).await.expect("replayed create succeeds");

        let found = repo
            .find_by_id(&TicketId("TKT-001".to_string()))
            .await
            .expect("find")
            .expect("exists");
        assert_eq!(found.summary, first.summary);
    }

    #[tokio::test]
    async fn list_for_user_filters_and_orders() {
        let pool = setup().await;
        let repo = SqlTicketRepository::new(pool);

        repo.create(sample_ticket("TKT-001", "emp-1")).await.expect("create 1");
        repo.create(sample_ticket("TKT-002", "emp-1")).await.expect("create 2");
        repo.create(sample_ticket("TKT-003", "emp-2")).await.expect("create 3");

        let tickets = repo.list_for_user("emp-1").await.expect("list");
        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|t| t.user_id == "emp-1"));
    }
}
