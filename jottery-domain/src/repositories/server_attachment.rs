// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Server-side attachment storage, scoped by client.

use async_trait::async_trait;

use crate::entities::ServerAttachment;
use crate::error::JotteryError;
use crate::value_objects::{ClientId, NoteId};

#[async_trait]
pub trait ServerAttachmentRepository: Send + Sync {
    /// Stores or overwrites the attachment. Pushes never reject an
    /// attachment, so this call has no conflict path of its own.
    async fn put(&self, attachment: &ServerAttachment) -> Result<(), JotteryError>;

    /// Every attachment referenced by one of `note_ids`, scoped to
    /// `client_id`. Used by pull to fill in the blobs for notes the
    /// requesting device has not seen before.
    async fn get_for_notes(&self, client_id: ClientId, note_ids: &[NoteId]) -> Result<Vec<ServerAttachment>, JotteryError>;
}
