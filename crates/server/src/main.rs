mod audit;
mod bootstrap;
mod health;
mod routes;

use std::sync::Arc;

use anyhow::Result;

use deskd_core::config::{AppConfig, LoadOptions};
use deskd_db::repositories::SqlAuditLogRepository;

fn init_logging(config: &AppConfig) {
    use deskd_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
    )
    .await?;

    let audit_repository = Arc::new(SqlAuditLogRepository::new(app.db_pool.clone()));
    tokio::spawn(audit::run_worker(app.audit_receiver, audit_repository));

    let state = routes::AppState {
        orchestrator: app.orchestrator,
        transcriber: app.transcriber,
        synthesizer: app.synthesizer,
    };
    let router = routes::router(state, app.db_pool.clone());

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        "deskd-server started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(app.config.server.graceful_shutdown_secs))
        .await?;

    tracing::info!(event_name = "system.server.stopping", "deskd-server stopping");

    Ok(())
}

async fn shutdown_signal(graceful_shutdown_secs: u64) {
    if let Err(signal_error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            error = %signal_error,
            "failed to listen for shutdown signal"
        );
        return;
    }

    tracing::info!(
        event_name = "system.server.shutdown_signal",
        grace_secs = graceful_shutdown_secs,
        "shutdown signal received, draining in-flight requests"
    );
}
