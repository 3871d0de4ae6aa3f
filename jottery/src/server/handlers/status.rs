// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `GET /api/v1/sync/status`

use axum::extract::State;
use axum::{Extension, Json};
use jottery_domain::error::JotteryError;
use jottery_domain::wire::StatusResponse;

use crate::server::auth::AuthenticatedClient;
use crate::server::AppState;

#[tracing::instrument(level = "debug", skip(state))]
pub async fn status(
    State(state): State<AppState>,
    Extension(AuthenticatedClient(client)): Extension<AuthenticatedClient>,
) -> Result<Json<StatusResponse>, JotteryError> {
    let notes = state.notes.list_since(client.id, None).await?;
    let server_last_modified = notes.iter().map(|n| n.server_modified_at).max();
    let note_count = notes.iter().filter(|n| !n.deleted).count() as u64;

    Ok(Json(StatusResponse {
        client_id: client.id,
        server_last_modified,
        note_count,
        last_synced_at: Some(client.last_seen_at),
    }))
}
