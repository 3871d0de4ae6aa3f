// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Attachment reference and blob storage.
//!
//! Split in two: [`AttachmentBlobRepository`] stores the large ciphertext
//! payload (and its thumbnail, if any) by an opaque handle, while the
//! [`crate::entities::AttachmentReference`] metadata row is addressed by
//! the stable [`crate::value_objects::AttachmentId`] through
//! [`crate::repositories::AttachmentReferenceRepository`]. Keeping the blob
//! behind a handle lets the local store swap
//! between "blob in the same SQLite file" and "blob on disk next to the
//! database" without the note service noticing.

use async_trait::async_trait;

use crate::error::JotteryError;

#[async_trait]
pub trait AttachmentBlobRepository: Send + Sync {
    /// Stores ciphertext under a freshly generated handle and returns it.
    async fn put(&self, ciphertext: &[u8]) -> Result<String, JotteryError>;

    async fn get(&self, handle: &str) -> Result<Option<Vec<u8>>, JotteryError>;

    async fn delete(&self, handle: &str) -> Result<(), JotteryError>;

    async fn put_thumbnail(&self, ciphertext: &[u8]) -> Result<String, JotteryError>;

    async fn get_thumbnail(&self, handle: &str) -> Result<Option<Vec<u8>>, JotteryError>;

    async fn delete_thumbnail(&self, handle: &str) -> Result<(), JotteryError>;

    /// Deletes every blob and thumbnail unconditionally, used only by a
    /// full-store wipe.
    async fn delete_all(&self) -> Result<(), JotteryError>;
}
