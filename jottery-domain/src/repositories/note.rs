// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! The local note repository.

use async_trait::async_trait;

use crate::entities::Note;
use crate::error::JotteryError;
use crate::value_objects::{NoteId, SortOrder};

/// Filters applied by [`NoteRepository::list`]. All fields are conjunctive:
/// a note must satisfy every `Some` field to be included.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    /// When `false` (the default), soft-deleted notes are excluded.
    pub include_deleted: bool,
    pub pinned_only: bool,
    pub sort: SortOrder,
}

/// Persistence for notes, operating purely on the already-encrypted form.
/// Nothing below this trait ever sees cleartext.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn insert(&self, note: &Note) -> Result<(), JotteryError>;

    async fn get(&self, id: NoteId) -> Result<Option<Note>, JotteryError>;

    /// Every note in `ids` that exists, in no particular order. Missing
    /// ids are simply absent from the result rather than an error.
    async fn get_by_ids(&self, ids: &[NoteId]) -> Result<Vec<Note>, JotteryError>;

    /// Replaces the stored row for `note.id`. Callers are responsible for
    /// bumping `note.version` before calling this; the repository does not
    /// enforce monotonicity itself.
    async fn update(&self, note: &Note) -> Result<(), JotteryError>;

    /// Stamps `modified_at = now()` without touching `version` or any
    /// other field. Used to record that a note was viewed/opened, which
    /// should bump nothing else since it isn't a content mutation.
    async fn touch(&self, id: NoteId) -> Result<(), JotteryError>;

    /// Records that `note_id` is now in sync with the server at
    /// `synced_at`, without bumping `version` or `modified_at` the way an
    /// ordinary content mutation would. Used exclusively by the sync
    /// engine's push-accept path.
    async fn mark_synced(&self, note_id: NoteId, synced_at: chrono::DateTime<chrono::Utc>) -> Result<(), JotteryError>;

    async fn list(&self, filter: &NoteFilter) -> Result<Vec<Note>, JotteryError>;

    /// Count of notes with `deleted = false`.
    async fn count_active(&self) -> Result<u64, JotteryError>;

    /// Count of notes with `deleted = true` (soft-deleted tombstones not
    /// yet purged).
    async fn count_deleted(&self) -> Result<u64, JotteryError>;

    /// Marks a note deleted without removing its row, so sync can still
    /// propagate the tombstone to the server.
    async fn soft_delete(&self, id: NoteId) -> Result<(), JotteryError>;

    async fn restore(&self, id: NoteId) -> Result<(), JotteryError>;

    /// Removes the row entirely. Only valid for notes already soft-deleted.
    async fn purge(&self, id: NoteId) -> Result<(), JotteryError>;

    /// Permanently removes soft-deleted notes whose `deleted_at` is older
    /// than the retention window, returning the number of rows removed.
    async fn purge_older_than(&self, cutoff: chrono::DateTime<chrono::Utc>) -> Result<u64, JotteryError>;

    /// Every note (including soft-deleted tombstones) with `modified_at`
    /// strictly newer than `since`, index-driven off `idx_notes_modified_at`.
    /// The sync engine's push pass uses this to find the set of locally
    /// changed notes without scanning the whole table.
    async fn list_modified_after(&self, since: chrono::DateTime<chrono::Utc>) -> Result<Vec<Note>, JotteryError>;

    /// Deletes every row unconditionally, used only by a full-store wipe.
    /// Bypasses the soft-delete-then-purge lifecycle entirely.
    async fn delete_all(&self) -> Result<(), JotteryError>;
}
