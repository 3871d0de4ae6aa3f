// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! `POST /api/v1/sync/pull`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Note;
use crate::value_objects::{AttachmentId, NoteId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub last_sync_at: Option<DateTime<Utc>>,
    pub known_note_ids: Vec<NoteId>,
}

/// A blob transported as base64 text, same shape on push and pull. Carries
/// the [`crate::entities::AttachmentReference`] metadata alongside the
/// ciphertext so a device pulling an attachment it has never seen before
/// can reconstruct a full reference row rather than just a handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentPayload {
    pub id: AttachmentId,
    /// Base64-encoded ciphertext.
    pub blob: String,
    pub filename_ciphertext: String,
    pub filename_iv: String,
    /// Cleartext; not secret.
    pub mime_type: String,
    /// Cleartext; not secret.
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionPayload {
    pub id: NoteId,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    pub notes: Vec<Note>,
    pub deletions: Vec<DeletionPayload>,
    pub attachments: Vec<AttachmentPayload>,
    pub synced_at: DateTime<Utc>,
}
