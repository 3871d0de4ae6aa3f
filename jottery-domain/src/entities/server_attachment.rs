// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Server-side mirror of an attachment blob plus its reference metadata,
//! scoped to the client that pushed it.

use serde::{Deserialize, Serialize};

use crate::value_objects::{AttachmentId, ClientId, NoteId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerAttachment {
    pub id: AttachmentId,
    pub client_id: ClientId,
    pub note_id: NoteId,
    pub blob: Vec<u8>,
    pub filename_ciphertext: String,
    pub filename_iv: String,
    /// Cleartext; not secret.
    pub mime_type: String,
    /// Cleartext; not secret.
    pub size_bytes: u64,
}
