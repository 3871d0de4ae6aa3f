// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Server-side note storage, keyed by `(client_id, note_id)`.

use async_trait::async_trait;

use crate::entities::ServerNote;
use crate::error::JotteryError;
use crate::value_objects::{ClientId, NoteId};

#[async_trait]
pub trait ServerNoteRepository: Send + Sync {
    async fn get(&self, client_id: ClientId, note_id: NoteId) -> Result<Option<ServerNote>, JotteryError>;

    /// Every note (including tombstones) strictly newer than `since`, for a
    /// pull request. `since = None` means "everything".
    async fn list_since(
        &self,
        client_id: ClientId,
        since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<ServerNote>, JotteryError>;

    /// Inserts or replaces the row unconditionally, keeping whatever
    /// `server_version`/`server_modified_at` the caller already computed.
    /// Used only for writes that do not go through the last-write-wins
    /// gate (an admin-initiated delete), never for an incoming sync push.
    async fn upsert(&self, note: &ServerNote) -> Result<u64, JotteryError>;

    /// Atomically applies last-write-wins for an incoming push: within a
    /// single transaction, reads the existing `(client_id, note_id)` row,
    /// accepts iff [`ServerNote::should_accept`] passes against
    /// `note.client_modified_at`, and if so assigns the next
    /// `server_version` and `server_modified_at` and writes. The caller's
    /// `note.server_version`/`server_modified_at` are ignored; they are
    /// server-assigned. Returns `None` when rejected. No other write can
    /// interleave between the read and the write for the same row.
    async fn try_push(&self, note: &ServerNote) -> Result<Option<ServerNote>, JotteryError>;
}
