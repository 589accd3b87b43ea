//! opsmedic -- anomaly detection and rule-based remediation for service metrics.
//!
//! This crate provides the core library for metric ingestion, isolation-forest
//! anomaly scoring, remediation orchestration with per-type cooldowns, and an
//! HTTP API exposing verdicts and action history.

pub mod api;
pub mod config;
pub mod detect;
pub mod engine;
pub mod remediate;
pub mod sample;
pub mod simulate;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::remediate::handler::LogActionHandler;
use crate::remediate::ActionHandler;

/// Start the opsmedic daemon: ingest API, scorer, and orchestrator.
///
/// Uses the log-only action handler; deployments with a real remediation
/// backend should build the engine themselves with their own
/// [`ActionHandler`].
pub async fn serve(bind: &str, db_path: &str, config: Config) -> Result<()> {
    tracing::info!(%db_path, "Initializing database");
    let pool = storage::open_pool(db_path)?;

    let handler: Arc<dyn ActionHandler> = Arc::new(LogActionHandler);
    let engine = Arc::new(engine::Engine::new(&config, handler, pool.clone()));

    let state = api::state::AppState { pool, engine };
    let app = api::router(state);

    let addr: std::net::SocketAddr = bind.parse()?;
    tracing::info!(%addr, "opsmedic listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
