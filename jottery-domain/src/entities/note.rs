// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Note entity
//!
//! The central entity of the system. The local store only ever sees the
//! encrypted form below; the note service is the sole place that crosses
//! the encryption boundary to produce a [`DecryptedNote`].
//!
//! ## Invariants
//!
//! - `modified_at >= created_at`
//! - if `deleted` then `deleted_at` is set and, at the moment of deletion,
//!   `deleted_at >= modified_at`
//! - `version >= 1` and strictly increases on every mutation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AttachmentId, NoteId};

/// A note as persisted by the local store: content and tags are opaque
/// ciphertext, the presentation hints travel alongside them in the clear.
///
/// This type doubles as the wire representation carried in
/// [`crate::wire::PushRequest`] and [`crate::wire::PullResponse`], so its
/// `Serialize`/`Deserialize` impls use `camelCase` field names per the
/// sync protocol; the SQLite adapter never round-trips through serde and
/// is unaffected by this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,

    /// Base64 AES-256-GCM ciphertext of the note content.
    pub content_ciphertext: String,
    /// IV used to produce `content_ciphertext`.
    pub content_iv: String,
    /// Base64 AES-256-GCM ciphertext of the JSON-encoded tag array.
    pub tags_ciphertext: String,
    /// IV used to produce `tags_ciphertext`.
    pub tags_iv: String,

    pub attachments: Vec<AttachmentId>,
    pub pinned: bool,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,

    /// SHA-256 digest of the cleartext content at last write, used for
    /// conflict detection without decrypting.
    pub content_hash: Option<[u8; 32]>,

    pub version: u64,

    /// Word-wrap preference. Not secret; travels in the clear.
    pub word_wrap: bool,
    /// Syntax-highlighting language tag. Not secret; travels in the clear.
    pub syntax_language: Option<String>,
}

impl Note {
    /// Checks the entity invariants that must hold after any mutation.
    /// Intended for debug assertions in the repository layer, not as a
    /// user-facing validator.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.modified_at < self.created_at {
            return Err("modified_at must not precede created_at".to_string());
        }
        if self.version < 1 {
            return Err("version must be >= 1".to_string());
        }
        if self.deleted {
            match self.deleted_at {
                Some(deleted_at) if deleted_at >= self.modified_at => {}
                Some(_) => return Err("deleted_at must not precede modified_at at deletion time".to_string()),
                None => return Err("deleted note must have deleted_at set".to_string()),
            }
        }
        Ok(())
    }
}

/// The cleartext view of a note returned by the note service's read path.
///
/// `decrypted_at` is purely for cache-aging heuristics in callers; it is
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedNote {
    pub id: NoteId,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
    pub content: String,
    pub tags: Vec<String>,
    pub attachments: Vec<AttachmentId>,
    pub pinned: bool,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: u64,
    pub word_wrap: bool,
    pub syntax_language: Option<String>,
    pub decrypted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_note() -> Note {
        let now = Utc::now();
        Note {
            id: NoteId::new(),
            created_at: now,
            modified_at: now,
            synced_at: None,
            content_ciphertext: String::new(),
            content_iv: String::new(),
            tags_ciphertext: String::new(),
            tags_iv: String::new(),
            attachments: Vec::new(),
            pinned: false,
            deleted: false,
            deleted_at: None,
            content_hash: None,
            version: 1,
            word_wrap: true,
            syntax_language: None,
        }
    }

    #[test]
    fn a_freshly_created_note_satisfies_its_invariants() {
        assert!(base_note().check_invariants().is_ok());
    }

    #[test]
    fn modified_before_created_is_rejected() {
        let mut note = base_note();
        note.modified_at = note.created_at - Duration::seconds(1);
        assert!(note.check_invariants().is_err());
    }

    #[test]
    fn deleted_without_deleted_at_is_rejected() {
        let mut note = base_note();
        note.deleted = true;
        assert!(note.check_invariants().is_err());
    }

    #[test]
    fn deleted_at_before_modified_at_is_rejected() {
        let mut note = base_note();
        note.deleted = true;
        note.deleted_at = Some(note.modified_at - Duration::seconds(1));
        assert!(note.check_invariants().is_err());
    }

    #[test]
    fn zero_version_is_rejected() {
        let mut note = base_note();
        note.version = 0;
        assert!(note.check_invariants().is_err());
    }
}
