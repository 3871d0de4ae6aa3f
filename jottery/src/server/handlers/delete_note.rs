// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `DELETE /api/v1/sync/notes/:id`
//!
//! The system specification's own open question on this endpoint notes
//! that mixing a true hard-delete here with the soft-delete tombstones
//! `pull` conveys produces undefined behavior for any client that expects
//! to see every deletion, and recommends treating this endpoint as
//! admin-only and preferring soft-delete. This implementation takes that
//! recommendation literally: it marks the row deleted and bumps
//! `server_version` rather than removing it, so the deletion still
//! propagates as a tombstone on the next pull instead of disappearing
//! silently for clients that have not yet synced.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use jottery_domain::error::JotteryError;
use jottery_domain::value_objects::NoteId;

use crate::server::auth::AuthenticatedClient;
use crate::server::AppState;

#[tracing::instrument(level = "info", skip(state))]
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(AuthenticatedClient(client)): Extension<AuthenticatedClient>,
    Path(note_id): Path<NoteId>,
) -> Result<StatusCode, JotteryError> {
    let Some(mut note) = state.notes.get(client.id, note_id).await? else {
        return Err(JotteryError::NotFound(format!("no note {note_id} for this client")));
    };

    note.deleted = true;
    note.deleted_at = Some(chrono::Utc::now());
    note.server_version += 1;
    note.server_modified_at = chrono::Utc::now();
    state.notes.upsert(&note).await?;

    state.audit.record(client.id, "delete", Some(note_id), "soft_delete", None).await?;

    Ok(StatusCode::NO_CONTENT)
}
