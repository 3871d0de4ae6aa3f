// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Attachment reference metadata, separate from the blob payload itself
//! (see [`crate::repositories::AttachmentBlobRepository`]). Keyed by
//! [`AttachmentId`], the same id a [`crate::entities::Note`] carries in
//! its `attachments` list.

use async_trait::async_trait;

use crate::entities::AttachmentReference;
use crate::error::JotteryError;
use crate::value_objects::AttachmentId;

#[async_trait]
pub trait AttachmentReferenceRepository: Send + Sync {
    async fn insert(&self, reference: &AttachmentReference) -> Result<(), JotteryError>;

    async fn get(&self, id: AttachmentId) -> Result<Option<AttachmentReference>, JotteryError>;

    async fn get_by_ids(&self, ids: &[AttachmentId]) -> Result<Vec<AttachmentReference>, JotteryError>;

    async fn update(&self, reference: &AttachmentReference) -> Result<(), JotteryError>;

    /// Removes the metadata row only; callers are responsible for deleting
    /// the referenced blob and thumbnail first, per the note service's
    /// permanent-delete ordering (blobs -> sync meta -> note).
    async fn delete(&self, id: AttachmentId) -> Result<(), JotteryError>;

    /// Deletes every reference row unconditionally, used only by a
    /// full-store wipe.
    async fn delete_all(&self) -> Result<(), JotteryError>;
}
