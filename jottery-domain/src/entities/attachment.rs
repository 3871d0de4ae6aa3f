// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Attachment reference entity.
//!
//! Invariant: every `blob_handle` referenced by a non-purged note must
//! resolve to an encrypted blob in the attachment blob repository; the note
//! service is responsible for maintaining this when it deletes or replaces
//! attachments.

use serde::{Deserialize, Serialize};

use crate::value_objects::AttachmentId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentReference {
    pub id: AttachmentId,
    /// Base64 AES-256-GCM ciphertext of the original filename.
    pub filename_ciphertext: String,
    pub filename_iv: String,
    /// Cleartext; not secret.
    pub mime_type: String,
    /// Cleartext; not secret.
    pub size_bytes: u64,
    /// Handle into the attachment blob repository.
    pub blob_handle: String,
    /// Handle into the thumbnail blob repository, if a thumbnail exists.
    /// Thumbnail *generation* is a presentation-layer concern out of scope
    /// here; this field only records the handle once one has been produced
    /// upstream.
    pub thumbnail_handle: Option<String>,
}
