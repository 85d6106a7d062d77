//! LubeSync - runs one sync campaign and exits
//!
//! Usage: `lubesync [EntityType]`. With no argument every registered type is
//! synchronized.

use std::sync::Arc;

use anyhow::Context;
use lubesync_app::AppContext;
use lubesync_domain::{Config, EntityType, SyncEventStatus, SyncRunState};
use lubesync_infra::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    let (config, config_error) = match lubesync_infra::config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    init_tracing(&config.logging);

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) => info!(error = %err, "No .env file loaded"),
    }
    if let Some(err) = config_error {
        warn!(error = %err, "Falling back to default configuration");
    }

    let ctx = Arc::new(AppContext::new(config).context("failed to build application context")?);
    let events = spawn_event_logger(&ctx);

    let report = match std::env::args().nth(1) {
        Some(name) => {
            let entity_type = EntityType::from_name(&name)
                .with_context(|| format!("unknown entity type: {name}"))?;
            ctx.orchestrator.sync_entity_type(entity_type).await
        }
        None => ctx.orchestrator.sync_all().await,
    };

    events.abort();
    info!(
        state = ?report.state,
        succeeded = report.result.success_count,
        failed = report.result.failure_count,
        conflicts = report.result.conflict_count,
        skipped = report.result.skipped_count,
        "sync_finished"
    );
    for entry in &report.result.errors {
        warn!(error = ?entry, "sync_item_failed");
    }

    if report.state == SyncRunState::Failed {
        anyhow::bail!("sync finished with {} failure(s)", report.result.failure_count);
    }
    Ok(())
}

/// Mirror progress events into the log.
fn spawn_event_logger(ctx: &AppContext) -> tokio::task::JoinHandle<()> {
    let mut receiver = ctx.orchestrator.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) if event.status == SyncEventStatus::Failed => warn!(
                    entity_type = %event.entity_type,
                    operation = ?event.operation,
                    message = ?event.message,
                    "sync_event"
                ),
                Ok(event) => info!(
                    entity_type = %event.entity_type,
                    operation = ?event.operation,
                    status = ?event.status,
                    message = ?event.message,
                    "sync_event"
                ),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "sync_event_logger_lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
