// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Global and per-note sync bookkeeping on the client side.

use async_trait::async_trait;

use crate::entities::{NoteSyncMetadata, SyncMetadataGlobal};
use crate::error::JotteryError;
use crate::value_objects::NoteId;

#[async_trait]
pub trait SyncMetadataRepository: Send + Sync {
    async fn get_global(&self) -> Result<SyncMetadataGlobal, JotteryError>;

    async fn put_global(&self, metadata: &SyncMetadataGlobal) -> Result<(), JotteryError>;

    async fn get_note(&self, note_id: NoteId) -> Result<Option<NoteSyncMetadata>, JotteryError>;

    async fn put_note(&self, metadata: &NoteSyncMetadata) -> Result<(), JotteryError>;

    /// Every note that is not currently [`SyncStatus::Synced`](crate::value_objects::SyncStatus::Synced),
    /// in the order a push pass should attempt them.
    async fn list_pending(&self) -> Result<Vec<NoteSyncMetadata>, JotteryError>;

    /// Count of per-note records currently in [`SyncStatus::Conflict`](crate::value_objects::SyncStatus::Conflict).
    async fn count_conflicts(&self) -> Result<u64, JotteryError>;

    async fn delete_note(&self, note_id: NoteId) -> Result<(), JotteryError>;

    /// Deletes every per-note record, used only by a full-store wipe. The
    /// global record is untouched; callers that also want it reset call
    /// [`SyncMetadataRepository::put_global`] with a fresh value.
    async fn clear_all(&self) -> Result<(), JotteryError>;
}
