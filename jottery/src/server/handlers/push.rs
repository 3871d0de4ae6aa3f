// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `POST /api/v1/sync/push`
//!
//! Each note's last-write-wins comparison and conditional write happen
//! inside `ServerNoteRepository::try_push`'s own transaction, not here:
//! this handler never reads the existing row itself, so there is no gap
//! between a read and a write for two concurrent pushes to race in
//! (spec §4.5's concurrency requirement). Attachments are never rejected;
//! they are stored by id unconditionally.

use axum::extract::State;
use axum::{Extension, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use jottery_domain::entities::ServerAttachment;
use jottery_domain::entities::ServerNote;
use jottery_domain::error::JotteryError;
use jottery_domain::wire::{AcceptedNote, PushRequest, PushResponse, RejectedNote};

use crate::server::auth::AuthenticatedClient;
use crate::server::{with_write_lock_timeout, AppState};

#[tracing::instrument(level = "debug", skip(state, request))]
pub async fn push(
    State(state): State<AppState>,
    Extension(AuthenticatedClient(client)): Extension<AuthenticatedClient>,
    Json(request): Json<PushRequest>,
) -> Result<Json<PushResponse>, JotteryError> {
    let mut response = PushResponse::default();

    // The wire payload carries attachments in a flat array with no note-id
    // field of their own; the only linkage available is each pushed note's
    // own `attachments` list, so build that map before consuming `notes`.
    let mut owning_note: std::collections::HashMap<jottery_domain::value_objects::AttachmentId, jottery_domain::value_objects::NoteId> =
        std::collections::HashMap::new();
    for note in &request.notes {
        for attachment_id in &note.attachments {
            owning_note.insert(*attachment_id, note.id);
        }
    }

    for note in request.notes {
        let note_id = note.id;
        let result = with_write_lock_timeout(apply_push(&state, client.id, &note)).await;

        match result {
            Ok(Some(accepted)) => {
                state
                    .audit
                    .record(client.id, "push", Some(note_id), "accepted", None)
                    .await?;
                response.accepted.push(accepted);
            }
            Ok(None) => {
                let existing = state.notes.get(client.id, note_id).await?;
                let server_modified_at = existing.map(|n| n.server_modified_at).unwrap_or_else(Utc::now);
                state
                    .audit
                    .record(client.id, "push", Some(note_id), "rejected", Some("server version is newer"))
                    .await?;
                response.rejected.push(RejectedNote {
                    id: note_id,
                    reason: "Server version is newer".to_string(),
                    server_modified_at,
                });
            }
            Err(e) => {
                state
                    .audit
                    .record(client.id, "push", Some(note_id), "error", Some(&e.to_string()))
                    .await
                    .ok();
                response.errors.push(format!("{note_id}: {e}"));
            }
        }
    }

    for attachment in request.attachments {
        let blob = BASE64
            .decode(&attachment.blob)
            .map_err(|_| JotteryError::ProtocolError("corrupt attachment blob".to_string()))?;

        // An attachment pushed without any note in this same batch
        // referencing it (e.g. a retry that resends only the blob) has no
        // owning note to record; skip it rather than invent one, since
        // `get_for_notes` would never surface it correctly anyway.
        let Some(&note_id) = owning_note.get(&attachment.id) else {
            continue;
        };

        let server_attachment = ServerAttachment {
            id: attachment.id,
            client_id: client.id,
            note_id,
            blob,
            filename_ciphertext: attachment.filename_ciphertext,
            filename_iv: attachment.filename_iv,
            mime_type: attachment.mime_type,
            size_bytes: attachment.size_bytes,
        };
        state.attachments.put(&server_attachment).await?;
    }

    Ok(Json(response))
}

/// `Some(accepted)` when the push won last-write-wins and was persisted;
/// `None` when an existing, equally-or-more-recent row rejected it.
async fn apply_push(
    state: &AppState,
    client_id: jottery_domain::value_objects::ClientId,
    note: &jottery_domain::entities::Note,
) -> Result<Option<AcceptedNote>, JotteryError> {
    let candidate = ServerNote {
        client_id,
        note_id: note.id,
        content_ciphertext: note.content_ciphertext.clone(),
        content_iv: note.content_iv.clone(),
        tags_ciphertext: note.tags_ciphertext.clone(),
        tags_iv: note.tags_iv.clone(),
        attachments: note.attachments.clone(),
        pinned: note.pinned,
        word_wrap: note.word_wrap,
        syntax_language: note.syntax_language.clone(),
        content_hash: note.content_hash,
        client_modified_at: note.modified_at,
        client_version: note.version,
        // Server-assigned; try_push ignores and overwrites both.
        server_version: 0,
        server_modified_at: Utc::now(),
        deleted: note.deleted,
        deleted_at: note.deleted_at,
    };

    let Some(accepted) = state.notes.try_push(&candidate).await? else {
        return Ok(None);
    };

    Ok(Some(AcceptedNote { id: note.id, server_version: accepted.server_version, synced_at: accepted.server_modified_at }))
}
