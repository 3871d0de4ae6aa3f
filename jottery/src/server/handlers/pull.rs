// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `POST /api/v1/sync/pull`

use axum::extract::State;
use axum::{Extension, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use jottery_domain::entities::Note;
use jottery_domain::error::JotteryError;
use jottery_domain::wire::{AttachmentPayload, DeletionPayload, PullRequest, PullResponse};

use crate::server::auth::AuthenticatedClient;
use crate::server::AppState;

#[tracing::instrument(level = "debug", skip(state, request))]
pub async fn pull(
    State(state): State<AppState>,
    Extension(AuthenticatedClient(client)): Extension<AuthenticatedClient>,
    Json(request): Json<PullRequest>,
) -> Result<Json<PullResponse>, JotteryError> {
    let since = request.last_sync_at;
    let all = state.notes.list_since(client.id, since).await?;

    let mut notes = Vec::new();
    let mut deletions = Vec::new();
    let mut new_note_ids = Vec::new();

    for server_note in all {
        if server_note.deleted {
            if let Some(deleted_at) = server_note.deleted_at {
                deletions.push(DeletionPayload { id: server_note.note_id, deleted_at });
            }
            continue;
        }

        if !request.known_note_ids.contains(&server_note.note_id) {
            new_note_ids.push(server_note.note_id);
        }

        notes.push(Note {
            id: server_note.note_id,
            // `ServerNote` has no independent `created_at` clock (spec
            // §4.5 tracks only `client_modified_at`/`server_modified_at`);
            // reusing the client's own modified-at clock here keeps the
            // `created_at <= modified_at` invariant intact rather than
            // risking `server_modified_at` (stamped later, on accept)
            // landing after it.
            created_at: server_note.client_modified_at,
            modified_at: server_note.client_modified_at,
            synced_at: Some(Utc::now()),
            content_ciphertext: server_note.content_ciphertext,
            content_iv: server_note.content_iv,
            tags_ciphertext: server_note.tags_ciphertext,
            tags_iv: server_note.tags_iv,
            attachments: server_note.attachments,
            pinned: server_note.pinned,
            deleted: false,
            deleted_at: None,
            content_hash: server_note.content_hash,
            version: server_note.client_version,
            word_wrap: server_note.word_wrap,
            syntax_language: server_note.syntax_language,
        });
    }

    let server_attachments = state.attachments.get_for_notes(client.id, &new_note_ids).await?;
    let attachments = server_attachments
        .into_iter()
        .map(|a| AttachmentPayload {
            id: a.id,
            blob: BASE64.encode(a.blob),
            filename_ciphertext: a.filename_ciphertext,
            filename_iv: a.filename_iv,
            mime_type: a.mime_type,
            size_bytes: a.size_bytes,
        })
        .collect();

    state.audit.record(client.id, "pull", None, "ok", None).await?;

    Ok(Json(PullResponse { notes, deletions, attachments, synced_at: Utc::now() }))
}
