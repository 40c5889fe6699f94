//! Async audit side channel: the orchestrator emits records into a bounded
//! mpsc channel and a background worker persists them. Writes are
//! best-effort — a full channel or an exhausted retry budget drops the
//! record with a logged error, never blocking or failing the response path.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, warn};

use deskd_core::audit::{AuditRecord, AuditSink};
use deskd_db::repositories::AuditLogRepository;

pub const AUDIT_CHANNEL_CAPACITY: usize = 256;

const MAX_WRITE_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 200;

/// `AuditSink` backed by the channel; `emit` never blocks.
pub struct ChannelAuditSink {
    sender: mpsc::Sender<AuditRecord>,
}

impl ChannelAuditSink {
    pub fn new(sender: mpsc::Sender<AuditRecord>) -> Self {
        Self { sender }
    }
}

impl AuditSink for ChannelAuditSink {
    fn emit(&self, record: AuditRecord) {
        if let Err(send_error) = self.sender.try_send(record) {
            let record = match send_error {
                mpsc::error::TrySendError::Full(record) => record,
                mpsc::error::TrySendError::Closed(record) => record,
            };
            error!(
                event_name = "server.audit.enqueue_failed",
                record_id = %record.record_id,
                conversation_id = %record.conversation_id,
                "audit channel unavailable, record dropped"
            );
        }
    }
}

/// Consumes the channel until every sender is dropped.
pub async fn run_worker(
    mut receiver: mpsc::Receiver<AuditRecord>,
    repository: Arc<dyn AuditLogRepository>,
) {
    while let Some(record) = receiver.recv().await {
        persist_with_retry(repository.as_ref(), record).await;
    }
}

async fn persist_with_retry(repository: &dyn AuditLogRepository, record: AuditRecord) {
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        match repository.append(&record).await {
            Ok(()) => return,
            Err(db_error) => {
                warn!(
                    event_name = "server.audit.write_failed",
                    record_id = %record.record_id,
                    attempt,
                    error = %db_error,
                    "audit write failed"
                );
                if attempt < MAX_WRITE_ATTEMPTS {
                    tokio::time::sleep(Duration::from_millis(
                        RETRY_BASE_DELAY_MS * u64::from(attempt),
                    ))
                    .await;
                }
            }
        }
    }

    error!(
        event_name = "server.audit.record_dropped",
        record_id = %record.record_id,
        conversation_id = %record.conversation_id,
        "audit record dropped after exhausting retries"
    );
}
