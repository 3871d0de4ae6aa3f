// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Global and per-note sync metadata.
//!
//! Invariant: every locally-existing, non-purged note has at most one
//! [`NoteSyncMetadata`] record — enforced by the repository's keying, not
//! by this type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ApiKey, NoteId, SyncStatus};

/// Singleton sync configuration and last-known state for the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncMetadataGlobal {
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_push_attempt_at: Option<DateTime<Utc>>,
    pub last_pull_attempt_at: Option<DateTime<Utc>>,
    pub api_key: ApiKey,
    pub client_id: Option<String>,
    pub sync_enabled: bool,
    pub sync_endpoint: Option<String>,
    /// Auto-sync interval in minutes.
    pub auto_sync_interval_minutes: u32,
}

impl Default for SyncMetadataGlobal {
    fn default() -> Self {
        Self {
            last_sync_at: None,
            last_push_attempt_at: None,
            last_pull_attempt_at: None,
            api_key: ApiKey::Absent,
            client_id: None,
            sync_enabled: false,
            sync_endpoint: None,
            auto_sync_interval_minutes: 5,
        }
    }
}

/// Per-note sync bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSyncMetadata {
    pub note_id: NoteId,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub content_hash_at_sync: Option<[u8; 32]>,
    pub server_version_at_sync: Option<u64>,
    pub status: SyncStatus,
    pub error_message: Option<String>,
}

impl NoteSyncMetadata {
    pub fn new_pending(note_id: NoteId) -> Self {
        Self {
            note_id,
            last_synced_at: None,
            content_hash_at_sync: None,
            server_version_at_sync: None,
            status: SyncStatus::Pending,
            error_message: None,
        }
    }
}
