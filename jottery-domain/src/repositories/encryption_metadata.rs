// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! The singleton encryption metadata row.
//!
//! There is at most one record for the lifetime of a local store: it is
//! written once, at first initialization, and read on every unlock.
//! Nothing in this crate ever updates it in place, since changing the salt
//! or iteration count without a full re-encryption pass would silently
//! corrupt every existing note.

use async_trait::async_trait;

use crate::entities::EncryptionMetadata;
use crate::error::JotteryError;

#[async_trait]
pub trait EncryptionMetadataRepository: Send + Sync {
    async fn get(&self) -> Result<Option<EncryptionMetadata>, JotteryError>;

    /// Fails with [`JotteryError::AlreadyInitialized`](crate::error::JotteryError::AlreadyInitialized)
    /// if a record already exists.
    async fn initialize(&self, metadata: &EncryptionMetadata) -> Result<(), JotteryError>;

    /// Deletes the existing row, if any, so a subsequent `initialize` can
    /// seed fresh metadata. Credential import uses this to replace the salt
    /// without deleting any notes.
    async fn clear(&self) -> Result<(), JotteryError>;
}
