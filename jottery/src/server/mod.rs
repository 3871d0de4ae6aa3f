// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Sync server core
//!
//! An `axum::Router<AppState>` exposing the endpoints in the external
//! interfaces table: `/health`, `/api/v1/auth/register`,
//! `/api/v1/sync/{status,push,pull}`, `/api/v1/sync/notes/:id`. State is a
//! small struct of `Arc<dyn Repository>` trait objects, the same shape the
//! application layer uses, so handlers never touch `sqlx` directly.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{middleware, Json, Router};
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::{RegisteredClientRepository, ServerAttachmentRepository, ServerNoteRepository};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::infrastructure::repositories::SyncOperationsAudit;

/// Shared state handed to every handler. Cloning is cheap: every field is
/// already an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<dyn RegisteredClientRepository>,
    pub notes: Arc<dyn ServerNoteRepository>,
    pub attachments: Arc<dyn ServerAttachmentRepository>,
    pub audit: Arc<dyn SyncOperationsAudit>,
    /// Bound for [`tower_http::limit::RequestBodyLimitLayer`], per spec §6.
    pub max_payload_bytes: usize,
}

/// Builds the router described by the external interfaces table, wrapped
/// in the ambient layers every axum service in the pack carries: request
/// tracing, permissive CORS (meant to be tightened at a reverse proxy per
/// spec §6), and a body-size limit.
pub fn build_router(state: AppState) -> Router {
    let max_payload_bytes = state.max_payload_bytes;

    let authenticated = Router::new()
        .route("/api/v1/sync/status", get(handlers::status::status))
        .route("/api/v1/sync/push", post(handlers::push::push))
        .route("/api/v1/sync/pull", post(handlers::pull::pull))
        .route("/api/v1/sync/notes/:id", delete(handlers::delete_note::delete_note))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_auth));

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/v1/auth/register", post(handlers::register::register))
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(max_payload_bytes))
        .with_state(state)
}

/// Maps domain errors to the status codes spec §7 names, with a JSON body
/// carrying the message so a client can surface something to the user.
impl IntoResponse for JotteryError {
    fn into_response(self) -> Response {
        let status = match &self {
            JotteryError::Unauthorized(_) | JotteryError::IncorrectPassword => StatusCode::UNAUTHORIZED,
            JotteryError::Forbidden(_) => StatusCode::FORBIDDEN,
            JotteryError::NotFound(_) => StatusCode::NOT_FOUND,
            JotteryError::Conflict(_) | JotteryError::PushRejected { .. } => StatusCode::CONFLICT,
            JotteryError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            JotteryError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Bounded wait for a per-`(client_id, note_id)` write lock, per spec §5
/// ("failure to acquire a write lock within a bounded time (default 5s)
/// surfaces as 503"). The lock itself is SQLite's RESERVED lock, taken by
/// `ServerNoteRepository::try_push`'s `BEGIN IMMEDIATE` transaction; this
/// is the timeout wrapped around waiting for it.
pub const WRITE_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn with_write_lock_timeout<F, T>(future: F) -> Result<T, JotteryError>
where
    F: std::future::Future<Output = Result<T, JotteryError>>,
{
    tokio::time::timeout(WRITE_LOCK_TIMEOUT, future)
        .await
        .map_err(|_| JotteryError::StorageUnavailable("timed out waiting for a write lock".to_string()))?
}
