use chrono::{DateTime, Utc};
use sqlx::Row;

use deskd_core::audit::{AuditRecord, SafetyOutcome};
use deskd_core::domain::risk::RiskLevel;

use super::{AuditLogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAuditLogRepository {
    pool: DbPool,
}

impl SqlAuditLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_risk_level(s: &str) -> RiskLevel {
    match s {
        "Low" => RiskLevel::Low,
        "Medium" => RiskLevel::Medium,
        "High" => RiskLevel::High,
        _ => RiskLevel::Unknown,
    }
}

fn parse_safety_outcome(s: &str) -> SafetyOutcome {
    match s {
        "BLOCKED" => SafetyOutcome::Blocked,
        _ => SafetyOutcome::Pass,
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<AuditRecord, RepositoryError> {
    let record_id: String =
        row.try_get("record_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let conversation_id: String =
        row.try_get("conversation_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let request_content: String =
        row.try_get("request_content").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let response_summary: String =
        row.try_get("response_summary").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let risk_level_str: String =
        row.try_get("risk_level").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let actions_json: String =
        row.try_get("actions").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let safety_outcome_str: String =
        row.try_get("safety_outcome").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let schema_version: String =
        row.try_get("schema_version").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let occurred_at_str: String =
        row.try_get("occurred_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let actions: Vec<String> = serde_json::from_str(&actions_json)
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let occurred_at = DateTime::parse_from_rfc3339(&occurred_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(AuditRecord {
        record_id,
        user_id,
        conversation_id,
        request_content,
        response_summary,
        risk_level: parse_risk_level(&risk_level_str),
        actions,
        safety_outcome: parse_safety_outcome(&safety_outcome_str),
        schema_version,
        occurred_at,
    })
}

#[async_trait::async_trait]
impl AuditLogRepository for SqlAuditLogRepository {
    async fn append(&self, record: &AuditRecord) -> Result<(), RepositoryError> {
        let actions_json = serde_json::to_string(&record.actions)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        // OR IGNORE so a retried delivery of the same record is harmless.
        sqlx::query(
            "INSERT OR IGNORE INTO audit_log
                 (record_id, user_id, conversation_id, request_content, response_summary,
                  risk_level, actions, safety_outcome, schema_version, occurred_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.record_id)
        .bind(&record.user_id)
        .bind(&record.conversation_id)
        .bind(&record.request_content)
        .bind(&record.response_summary)
        .bind(record.risk_level.as_str())
        .bind(&actions_json)
        .bind(record.safety_outcome.as_str())
        .bind(&record.schema_version)
        .bind(record.occurred_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<AuditRecord>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT record_id, user_id, conversation_id, request_content, response_summary,
                    risk_level, actions, safety_outcome, schema_version, occurred_at
             FROM audit_log WHERE conversation_id = ? ORDER BY occurred_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use deskd_core::audit::{AuditRecord, SafetyOutcome};
    use deskd_core::domain::risk::RiskLevel;

    use super::SqlAuditLogRepository;
    use crate::repositories::AuditLogRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_record(conversation_id: &str) -> AuditRecord {
        AuditRecord::new(
            "emp-1",
            conversation_id,
            "my laptop is frozen",
            "restart scheduled",
            RiskLevel::Medium,
            vec!["Contextual Analysis".to_string()],
            SafetyOutcome::Pass,
        )
    }

    #[tokio::test]
    async fn append_and_list_round_trip() {
        let pool = setup().await;
        let repo = SqlAuditLogRepository::new(pool);

        let record = sample_record("conv-1");
        repo.append(&record).await.expect("append");

        let records = repo.list_for_conversation("conv-1").await.expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], record);
    }

    #[tokio::test]
    async fn retried_append_of_same_record_is_ignored() {
        let pool = setup().await;
        let repo = SqlAuditLogRepository::new(pool);

        let record = sample_record("conv-1");
        repo.append(&record).await.expect("first append");
        repo.append(&record).await.expect("retry append");

        let records = repo.list_for_conversation("conv-1").await.expect("list");
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn list_scopes_to_conversation() {
        let pool = setup().await;
        let repo = SqlAuditLogRepository::new(pool);

        repo.append(&sample_record("conv-1")).await.expect("append 1");
        repo.append(&sample_record("conv-2")).await.expect("append 2");

        let records = repo.list_for_conversation("conv-2").await.expect("list");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].conversation_id, "conv-2");
    }
}
