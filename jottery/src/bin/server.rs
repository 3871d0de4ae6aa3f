// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `jottery-server`: the sync server binary.
//!
//! Loads configuration from the environment, brings up the server-side
//! SQLite store, binds the axum router, and serves until a SIGINT/SIGTERM
//! triggers a graceful drain through `jottery-bootstrap::shutdown`.

use std::sync::Arc;

use jottery::infrastructure::config::AppConfig;
use jottery::infrastructure::logging;
use jottery::infrastructure::repositories::schema::initialize_server_database;
use jottery::infrastructure::repositories::{
    SqliteRegisteredClientRepository, SqliteServerAttachmentRepository, SqliteServerNoteRepository,
    SqliteSyncOperationsAudit,
};
use jottery::server::{build_router, AppState};
use jottery_bootstrap::{listen_for_signals, ShutdownCoordinator};
use jottery_domain::JotteryError;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    jottery_bootstrap::result_to_exit_code(run().await)
}

async fn run() -> Result<(), JotteryError> {
    let config = AppConfig::load().map_err(|e| JotteryError::InternalError(e.to_string()))?;
    logging::init(&config.log_level);

    tracing::info!(port = config.port, database_url = %config.database_url, "starting jottery-server");

    let pool = initialize_server_database(&config.database_url).await?;

    let state = AppState {
        clients: Arc::new(SqliteRegisteredClientRepository::new(pool.clone())),
        notes: Arc::new(SqliteServerNoteRepository::new(pool.clone())),
        attachments: Arc::new(SqliteServerAttachmentRepository::new(pool.clone())),
        audit: Arc::new(SqliteSyncOperationsAudit::new(pool)),
        max_payload_bytes: config.max_payload_bytes,
    };

    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .map_err(|e| JotteryError::StorageUnavailable(format!("failed to bind port {}: {e}", config.port)))?;

    let coordinator = ShutdownCoordinator::new(std::time::Duration::from_secs(
        jottery_bootstrap::shutdown::DEFAULT_GRACE_PERIOD_SECS,
    ));
    let shutdown_signal = listen_for_signals(coordinator.clone());

    tracing::info!(port = config.port, "jottery-server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal.await;
        })
        .await
        .map_err(|e| JotteryError::InternalError(format!("server error: {e}")))?;

    Ok(())
}
