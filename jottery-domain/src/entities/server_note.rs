// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Server-side note record.
//!
//! Keyed by `(client_id, note_id)` in the repository, not by `note_id`
//! alone: two different clients may legitimately push notes that share a
//! `NoteId` only by coincidence of a bug upstream, and the server must not
//! conflate them.
//!
//! The server never decrypts `content_ciphertext`; conflict resolution is
//! last-write-wins on `client_modified_at`, not on cleartext content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AttachmentId, ClientId, NoteId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerNote {
    pub client_id: ClientId,
    pub note_id: NoteId,

    pub content_ciphertext: String,
    pub content_iv: String,
    pub tags_ciphertext: String,
    pub tags_iv: String,

    pub attachments: Vec<AttachmentId>,
    pub pinned: bool,
    pub word_wrap: bool,
    pub syntax_language: Option<String>,

    pub content_hash: Option<[u8; 32]>,

    /// The client's own `modified_at`, used as the last-write-wins clock.
    pub client_modified_at: DateTime<Utc>,
    /// The client's own `version` at the time of this push.
    pub client_version: u64,

    /// Server-assigned, strictly increasing per `(client_id, note_id)`.
    /// Bumped on every accepted push, independent of `client_version`.
    pub server_version: u64,
    pub server_modified_at: DateTime<Utc>,

    /// Independent of the client's own `deleted` flag: a client may restore
    /// a note it previously deleted, and the server must be able to tell
    /// "deleted here" apart from "never told about a restore yet".
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ServerNote {
    /// Whether an incoming push with the given client clock should win
    /// over this record, per the last-write-wins policy.
    pub fn should_accept(&self, incoming_client_modified_at: DateTime<Utc>) -> bool {
        incoming_client_modified_at >= self.client_modified_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_note() -> ServerNote {
        let now = Utc::now();
        ServerNote {
            client_id: ClientId::new(),
            note_id: NoteId::new(),
            content_ciphertext: String::new(),
            content_iv: String::new(),
            tags_ciphertext: String::new(),
            tags_iv: String::new(),
            attachments: Vec::new(),
            pinned: false,
            word_wrap: true,
            syntax_language: None,
            content_hash: None,
            client_modified_at: now,
            client_version: 1,
            server_version: 1,
            server_modified_at: now,
            deleted: false,
            deleted_at: None,
        }
    }

    #[test]
    fn a_strictly_newer_push_is_accepted() {
        let note = base_note();
        assert!(note.should_accept(note.client_modified_at + Duration::seconds(1)));
    }

    #[test]
    fn an_equal_timestamp_is_accepted() {
        let note = base_note();
        assert!(note.should_accept(note.client_modified_at));
    }

    #[test]
    fn a_strictly_older_push_is_rejected() {
        let note = base_note();
        assert!(!note.should_accept(note.client_modified_at - Duration::seconds(1)));
    }
}
