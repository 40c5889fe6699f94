use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use deskd_agent::capabilities::{
    AutomationRunner, EmployeeDirectory, EscalationNotifier, KnowledgeIndex, SentimentAnalyzer,
    SpeechSynthesizer, SpeechTranscriber,
};
use deskd_agent::llm::ChatCompletion;
use deskd_agent::safety::{Moderation, SafetyGate};
use deskd_agent::session::SessionStore;
use deskd_agent::tool_loop::ToolLoop;
use deskd_agent::tools::StandardTools;
use deskd_agent::{IntentDetector, Orchestrator};
use deskd_capabilities::{
    Disabled, HttpAutomationRunner, HttpEmployeeDirectory, HttpKnowledgeIndex, HttpModeration,
    HttpSentimentAnalyzer, HttpSpeechSynthesizer, HttpSpeechTranscriber, OpenAiChatCompletion,
    WebhookEscalationNotifier,
};
use deskd_core::audit::AuditRecord;
use deskd_core::config::{AppConfig, ConfigError, LoadOptions};
use deskd_core::errors::CapabilityError;
use deskd_db::repositories::SqlTicketRepository;
use deskd_db::{connect, migrations, DbPool};

use crate::audit::{ChannelAuditSink, AUDIT_CHANNEL_CAPACITY};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub orchestrator: Arc<Orchestrator>,
    pub transcriber: Arc<dyn SpeechTranscriber>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    /// Consumed by the audit worker spawned in `run`.
    pub audit_receiver: mpsc::Receiver<AuditRecord>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("capability construction failed: {0}")]
    Capability(#[from] CapabilityError),
    #[error("intent patterns failed to compile: {0}")]
    IntentPatterns(#[source] regex::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let moderation: Arc<dyn Moderation> = if config.moderation.base_url.is_some() {
        Arc::new(HttpModeration::new(&config.moderation)?)
    } else {
        warn!(
            event_name = "system.bootstrap.moderation_disabled",
            "no moderation endpoint configured; the safety gate will fail open"
        );
        Arc::new(Disabled::new("moderation"))
    };

    let completion: Arc<dyn ChatCompletion> =
        Arc::new(OpenAiChatCompletion::new(&config.completion)?);

    let sentiment: Option<Arc<dyn SentimentAnalyzer>> = if config.sentiment.base_url.is_some() {
        Some(Arc::new(HttpSentimentAnalyzer::new(&config.sentiment)?))
    } else {
        None
    };

    let directory: Arc<dyn EmployeeDirectory> = if config.directory.base_url.is_some() {
        Arc::new(HttpEmployeeDirectory::new(&config.directory)?)
    } else {
        Arc::new(Disabled::new("directory"))
    };

    let index: Arc<dyn KnowledgeIndex> = if config.search.base_url.is_some() {
        Arc::new(HttpKnowledgeIndex::new(&config.search)?)
    } else {
        Arc::new(Disabled::new("search"))
    };

    let runner: Arc<dyn AutomationRunner> = if config.automation.base_url.is_some() {
        Arc::new(HttpAutomationRunner::new(&config.automation)?)
    } else {
        Arc::new(Disabled::new("automation"))
    };

    let notifier: Arc<dyn EscalationNotifier> =
        match config.automation.escalation_webhook_url.as_deref() {
            Some(url) => Arc::new(WebhookEscalationNotifier::new(url)?),
            None => Arc::new(Disabled::new("escalation webhook")),
        };

    let transcriber: Arc<dyn SpeechTranscriber> = if config.speech.base_url.is_some() {
        Arc::new(HttpSpeechTranscriber::new(&config.speech)?)
    } else {
        Arc::new(Disabled::new("speech"))
    };
    let synthesizer: Arc<dyn SpeechSynthesizer> = if config.speech.base_url.is_some() {
        Arc::new(HttpSpeechSynthesizer::new(&config.speech)?)
    } else {
        Arc::new(Disabled::new("speech"))
    };

    let tools = StandardTools {
        directory,
        index,
        runner,
        notifier,
        tickets: Arc::new(SqlTicketRepository::new(db_pool.clone())),
    };

    let (audit_sender, audit_receiver) = mpsc::channel(AUDIT_CHANNEL_CAPACITY);

    let orchestrator = Arc::new(Orchestrator::new(
        SessionStore::new(&config.sessions),
        SafetyGate::new(moderation, config.moderation.severity_cutoff),
        IntentDetector::new().map_err(BootstrapError::IntentPatterns)?,
        ToolLoop::new(completion, config.completion.max_tool_rounds),
        Arc::new(tools),
        sentiment,
        Arc::new(ChannelAuditSink::new(audit_sender)),
    ));

    info!(event_name = "system.bootstrap.ready", "application wiring complete");
    Ok(Application { config, db_pool, orchestrator, transcriber, synthesizer, audit_receiver })
}

#[cfg(test)]
mod tests {
    use deskd_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn memory_options() -> LoadOptions {
        LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_wires_the_pipeline() {
        let app = bootstrap(memory_options()).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('tickets', 'audit_log')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("baseline tables present");
        assert_eq!(table_count, 2);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_rejects_non_sqlite_database_url() {
        let result = bootstrap(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            overrides: ConfigOverrides {
                database_url: Some("postgres://localhost/deskd".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
    }
}
