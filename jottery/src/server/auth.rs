// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Bearer-token authentication middleware, per spec §4.5: hash the
//! presented key, look it up, reject unknown or inactive clients.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jottery_domain::error::JotteryError;
use jottery_domain::entities::RegisteredClient;

use super::AppState;

/// Injected into request extensions by [`require_bearer_auth`] so
/// downstream handlers can read the authenticated client without a second
/// lookup.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient(pub RegisteredClient);

pub async fn require_bearer_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match authenticate(&state, &request).await {
        Ok(client) => {
            if let Err(e) = state.clients.touch_last_seen(client.id).await {
                return e.into_response();
            }
            request.extensions_mut().insert(AuthenticatedClient(client));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn authenticate(state: &AppState, request: &Request) -> Result<RegisteredClient, JotteryError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| JotteryError::Unauthorized("missing Authorization header".to_string()))?;

    let key = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| JotteryError::Unauthorized("expected a Bearer token".to_string()))?;

    let hash = hex::encode(crate::infrastructure::crypto::cipher::hash(key));

    let client = state
        .clients
        .get_by_api_key_hash(&hash)
        .await?
        .ok_or_else(|| JotteryError::Unauthorized("unknown api key".to_string()))?;

    if !client.active {
        return Err(JotteryError::Forbidden("client is deactivated".to_string()));
    }

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::crypto::cipher;
    use crate::infrastructure::repositories::schema::initialize_server_database;
    use crate::infrastructure::repositories::{SqliteRegisteredClientRepository, SqliteServerAttachmentRepository, SqliteServerNoteRepository, SqliteSyncOperationsAudit};
    use crate::server::{build_router, AppState};
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use chrono::Utc;
    use jottery_domain::value_objects::ClientId;
    use std::sync::Arc;
    use tempfile::NamedTempFile;
    use tower::ServiceExt;

    async fn test_state() -> (AppState, String, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();

        let clients = Arc::new(SqliteRegisteredClientRepository::new(pool.clone()));
        let raw_key = "c".repeat(64);
        let hash = hex::encode(cipher::hash(&raw_key));
        let client = RegisteredClient {
            id: ClientId::new(),
            api_key_hash: hash,
            device_name: "laptop".to_string(),
            device_type: "cli".to_string(),
            created_at: Utc::now(),
            last_seen_at: Utc::now(),
            active: true,
        };
        clients.insert(&client).await.unwrap();

        let state = AppState {
            clients,
            notes: Arc::new(SqliteServerNoteRepository::new(pool.clone())),
            attachments: Arc::new(SqliteServerAttachmentRepository::new(pool.clone())),
            audit: Arc::new(SqliteSyncOperationsAudit::new(pool)),
            max_payload_bytes: 10 * 1024 * 1024,
        };
        (state, raw_key, temp)
    }

    #[tokio::test]
    async fn request_without_a_bearer_header_is_rejected() {
        let (state, _key, _temp) = test_state().await;
        let app = build_router(state);
        let response = app
            .oneshot(HttpRequest::get("/api/v1/sync/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn request_with_a_valid_bearer_token_is_authenticated() {
        let (state, key, _temp) = test_state().await;
        let app = build_router(state);
        let response = app
            .oneshot(
                HttpRequest::get("/api/v1/sync/status")
                    .header("Authorization", format!("Bearer {key}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn deactivated_clients_are_forbidden() {
        let (state, key, _temp) = test_state().await;
        let hash = hex::encode(cipher::hash(&key));
        let client = state.clients.get_by_api_key_hash(&hash).await.unwrap().unwrap();
        state.clients.deactivate(client.id).await.unwrap();

        let app = build_router(state);
        let response = app
            .oneshot(
                HttpRequest::get("/api/v1/sync/status")
                    .header("Authorization", format!("Bearer {key}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::FORBIDDEN);
    }
}
