// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! The note service: the sole place that crosses the encryption boundary.
//!
//! Every public method takes or returns cleartext and talks to the
//! repositories in ciphertext; nothing below this layer ever sees a
//! plaintext note. Every mutation marks the note's sync record `Pending`
//! so the sync engine picks it up on the next push, without this module
//! knowing anything about sync transport.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jottery_domain::entities::{DecryptedNote, Note, NoteSyncMetadata, SyncMetadataGlobal};
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::{
    AttachmentBlobRepository, AttachmentReferenceRepository, EncryptionMetadataRepository, NoteFilter, NoteRepository,
    SyncMetadataRepository,
};
use jottery_domain::value_objects::{normalize_tags, transition, AttachmentId, NoteId, SortOrder, SyncEvent};
use tracing::instrument;

use crate::infrastructure::crypto::{cipher, KeyManager};

/// Default soft-delete retention window, per [`NoteService::purge_old`].
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Input to [`NoteService::create`]. `created_at`/`modified_at` are
/// normally left `None` (stamped with `now()`); credential/data import is
/// the one caller that supplies both explicitly.
#[derive(Debug, Clone)]
pub struct CreateNoteInput {
    pub content: String,
    pub tags: Vec<String>,
    pub word_wrap: bool,
    pub syntax_language: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Default for CreateNoteInput {
    fn default() -> Self {
        Self {
            content: String::new(),
            tags: Vec::new(),
            word_wrap: true,
            syntax_language: None,
            created_at: None,
            modified_at: None,
        }
    }
}

/// Input to [`NoteService::update`]. Every field is independently
/// optional; `None` leaves the corresponding column untouched.
/// `syntax_language: Some(None)` clears the language back to unset, which
/// is why it is doubly-optional rather than a single `Option<String>`.
#[derive(Debug, Clone, Default)]
pub struct UpdateNoteInput {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub attachments: Option<Vec<AttachmentId>>,
    pub pinned: Option<bool>,
    pub word_wrap: Option<bool>,
    pub syntax_language: Option<Option<String>>,
}

pub struct NoteService {
    notes: Arc<dyn NoteRepository>,
    attachment_blobs: Arc<dyn AttachmentBlobRepository>,
    attachment_refs: Arc<dyn AttachmentReferenceRepository>,
    sync_metadata: Arc<dyn SyncMetadataRepository>,
    encryption_metadata: Arc<dyn EncryptionMetadataRepository>,
    key_manager: KeyManager,
}

impl NoteService {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        attachment_blobs: Arc<dyn AttachmentBlobRepository>,
        attachment_refs: Arc<dyn AttachmentReferenceRepository>,
        sync_metadata: Arc<dyn SyncMetadataRepository>,
        encryption_metadata: Arc<dyn EncryptionMetadataRepository>,
        key_manager: KeyManager,
    ) -> Self {
        Self {
            notes,
            attachment_blobs,
            attachment_refs,
            sync_metadata,
            encryption_metadata,
            key_manager,
        }
    }

    #[instrument(level = "debug", skip(self, input))]
    pub async fn create(&self, input: CreateNoteInput) -> Result<DecryptedNote, JotteryError> {
        let key = self.key_manager.current_key().ok_or(JotteryError::Locked)?;
        let tags = normalize_tags(input.tags);

        let content_envelope = cipher::encrypt_text(&input.content, &key)?;
        let tags_json = serde_json::to_string(&tags).map_err(|e| JotteryError::InternalError(e.to_string()))?;
        let tags_envelope = cipher::encrypt_text(&tags_json, &key)?;

        let created_at = input.created_at.unwrap_or_else(Utc::now);
        let modified_at = input.modified_at.unwrap_or(created_at).max(created_at);

        let note = Note {
            id: NoteId::new(),
            created_at,
            modified_at,
            synced_at: None,
            content_ciphertext: content_envelope.ciphertext,
            content_iv: content_envelope.iv,
            tags_ciphertext: tags_envelope.ciphertext,
            tags_iv: tags_envelope.iv,
            attachments: Vec::new(),
            pinned: false,
            deleted: false,
            deleted_at: None,
            content_hash: Some(cipher::hash(&input.content)),
            version: 1,
            word_wrap: input.word_wrap,
            syntax_language: input.syntax_language,
        };

        self.notes.insert(&note).await.map_err(|e| e.with_note_context(&note.id.to_string()))?;
        self.mark_pending(note.id).await?;
        self.decrypt(&note, &key)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, id: NoteId) -> Result<DecryptedNote, JotteryError> {
        let key = self.key_manager.current_key().ok_or(JotteryError::Locked)?;
        let note = self
            .notes
            .get(id)
            .await?
            .ok_or_else(|| JotteryError::NotFound(id.to_string()))?;
        self.decrypt(&note, &key)
    }

    /// Lists notes per `filter`, pinned-first. Every [`SortOrder`] but
    /// [`SortOrder::Alpha`] is pushed down to the repository's index; alpha
    /// sorts on the first line of decrypted content, which only this layer
    /// can see, so it is re-sorted here after decryption.
    #[instrument(level = "debug", skip(self))]
    pub async fn list(&self, filter: NoteFilter) -> Result<Vec<DecryptedNote>, JotteryError> {
        let key = self.key_manager.current_key().ok_or(JotteryError::Locked)?;
        let alpha = filter.sort == SortOrder::Alpha;
        let notes = self.notes.list(&filter).await?;

        let mut decrypted = notes
            .iter()
            .map(|note| self.decrypt(note, &key))
            .collect::<Result<Vec<_>, _>>()?;

        if alpha {
            decrypted.sort_by(|a, b| {
                let a_key = (!a.pinned, first_line_case_folded(&a.content));
                let b_key = (!b.pinned, first_line_case_folded(&b.content));
                a_key.cmp(&b_key)
            });
        }

        Ok(decrypted)
    }

    #[instrument(level = "debug", skip(self, input))]
    pub async fn update(&self, id: NoteId, input: UpdateNoteInput) -> Result<DecryptedNote, JotteryError> {
        let key = self.key_manager.current_key().ok_or(JotteryError::Locked)?;
        let mut note = self
            .notes
            .get(id)
            .await?
            .ok_or_else(|| JotteryError::NotFound(id.to_string()))?;

        if let Some(content) = &input.content {
            let envelope = cipher::encrypt_text(content, &key)?;
            note.content_ciphertext = envelope.ciphertext;
            note.content_iv = envelope.iv;
            note.content_hash = Some(cipher::hash(content));
        }

        if let Some(tags) = input.tags {
            let tags = normalize_tags(tags);
            let tags_json = serde_json::to_string(&tags).map_err(|e| JotteryError::InternalError(e.to_string()))?;
            let envelope = cipher::encrypt_text(&tags_json, &key)?;
            note.tags_ciphertext = envelope.ciphertext;
            note.tags_iv = envelope.iv;
        }

        if let Some(new_attachments) = input.attachments {
            let removed: Vec<AttachmentId> =
                note.attachments.iter().filter(|id| !new_attachments.contains(id)).copied().collect();
            for attachment_id in removed {
                self.delete_attachment(attachment_id).await?;
            }
            note.attachments = new_attachments;
        }

        if let Some(pinned) = input.pinned {
            note.pinned = pinned;
        }
        if let Some(word_wrap) = input.word_wrap {
            note.word_wrap = word_wrap;
        }
        if let Some(syntax_language) = input.syntax_language {
            note.syntax_language = syntax_language;
        }

        note.version += 1;
        note.modified_at = Utc::now();

        self.notes.update(&note).await.map_err(|e| e.with_note_context(&id.to_string()))?;
        self.mark_pending(id).await?;
        self.decrypt(&note, &key)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn toggle_pin(&self, id: NoteId) -> Result<DecryptedNote, JotteryError> {
        let note = self
            .notes
            .get(id)
            .await?
            .ok_or_else(|| JotteryError::NotFound(id.to_string()))?;
        self.update(id, UpdateNoteInput { pinned: Some(!note.pinned), ..Default::default() }).await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn soft_delete(&self, id: NoteId) -> Result<(), JotteryError> {
        self.notes.soft_delete(id).await.map_err(|e| e.with_note_context(&id.to_string()))?;
        self.mark_pending(id).await
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn restore(&self, id: NoteId) -> Result<(), JotteryError> {
        self.notes.restore(id).await.map_err(|e| e.with_note_context(&id.to_string()))?;
        self.mark_pending(id).await
    }

    /// Deletes blobs, then the sync record, then the note row, in that
    /// order. Re-running against an already-purged id is a no-op, not an
    /// error, so retries are safe.
    #[instrument(level = "debug", skip(self))]
    pub async fn permanent_delete(&self, id: NoteId) -> Result<(), JotteryError> {
        let Some(note) = self.notes.get(id).await? else {
            return Ok(());
        };

        for attachment_id in note.attachments {
            self.delete_attachment(attachment_id).await?;
        }
        self.sync_metadata.delete_note(id).await?;
        self.notes.purge(id).await.map_err(|e| e.with_note_context(&id.to_string()))?;
        Ok(())
    }

    /// Permanently removes every soft-deleted note whose `deleted_at`
    /// predates `now() - retention`, cascading attachments exactly as
    /// [`NoteService::permanent_delete`] does. Returns the count removed.
    #[instrument(level = "debug", skip(self))]
    pub async fn purge_old(&self, retention: Option<Duration>) -> Result<u64, JotteryError> {
        let retention = retention.unwrap_or_else(|| Duration::days(DEFAULT_RETENTION_DAYS));
        let cutoff = Utc::now() - retention;

        let candidates = self
            .notes
            .list(&NoteFilter {
                include_deleted: true,
                ..Default::default()
            })
            .await?;

        let mut purged = 0u64;
        for note in candidates {
            if note.deleted && note.deleted_at.is_some_and(|deleted_at| deleted_at < cutoff) {
                self.permanent_delete(note.id).await?;
                purged += 1;
            }
        }
        Ok(purged)
    }

    /// Deletes every note, attachment blob/thumbnail, attachment reference,
    /// and sync record, then clears the encryption metadata row and wipes
    /// the key manager. From the caller's perspective this is atomic: no
    /// read that happens after this returns `Ok(())` can observe any
    /// pre-wipe bytes, since `KeyManager::wipe` is the last step and every
    /// decrypt call needs a key that no longer exists.
    ///
    /// Deliberately irreversible: there is no `restore` counterpart. A
    /// subsequent write (including a fresh `initialize`) anchors a new
    /// password against an empty store, exactly like first run.
    #[instrument(level = "debug", skip(self))]
    pub async fn wipe_store(&self) -> Result<(), JotteryError> {
        self.notes.delete_all().await?;
        self.attachment_blobs.delete_all().await?;
        self.attachment_refs.delete_all().await?;
        self.sync_metadata.clear_all().await?;
        self.sync_metadata.put_global(&SyncMetadataGlobal::default()).await?;
        self.encryption_metadata.clear().await?;
        self.key_manager.wipe();
        Ok(())
    }

    async fn delete_attachment(&self, attachment_id: AttachmentId) -> Result<(), JotteryError> {
        if let Some(reference) = self.attachment_refs.get(attachment_id).await? {
            self.attachment_blobs.delete(&reference.blob_handle).await?;
            if let Some(thumbnail_handle) = &reference.thumbnail_handle {
                self.attachment_blobs.delete_thumbnail(thumbnail_handle).await?;
            }
            self.attachment_refs.delete(attachment_id).await?;
        }
        Ok(())
    }

    async fn mark_pending(&self, id: NoteId) -> Result<(), JotteryError> {
        let mut metadata = self
            .sync_metadata
            .get_note(id)
            .await?
            .unwrap_or_else(|| NoteSyncMetadata::new_pending(id));
        metadata.status = transition(metadata.status, SyncEvent::LocalMutation);
        self.sync_metadata.put_note(&metadata).await
    }

    fn decrypt(&self, note: &Note, key: &crate::infrastructure::crypto::SecureKey) -> Result<DecryptedNote, JotteryError> {
        let content_envelope = cipher::Envelope {
            ciphertext: note.content_ciphertext.clone(),
            iv: note.content_iv.clone(),
        };
        let content = cipher::decrypt_text(&content_envelope, key).map_err(|_| JotteryError::DecryptError)?;

        let tags_envelope = cipher::Envelope {
            ciphertext: note.tags_ciphertext.clone(),
            iv: note.tags_iv.clone(),
        };
        let tags_json = cipher::decrypt_text(&tags_envelope, key).map_err(|_| JotteryError::DecryptError)?;
        let tags: Vec<String> =
            serde_json::from_str(&tags_json).map_err(|e| JotteryError::InternalError(format!("corrupt tag payload: {e}")))?;

        Ok(DecryptedNote {
            id: note.id,
            created_at: note.created_at,
            modified_at: note.modified_at,
            synced_at: note.synced_at,
            content,
            tags,
            attachments: note.attachments.clone(),
            pinned: note.pinned,
            deleted: note.deleted,
            deleted_at: note.deleted_at,
            version: note.version,
            word_wrap: note.word_wrap,
            syntax_language: note.syntax_language.clone(),
            decrypted_at: Utc::now(),
        })
    }
}

fn first_line_case_folded(content: &str) -> String {
    content.lines().next().unwrap_or("").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_client_database;
    use crate::infrastructure::repositories::{
        SqliteAttachmentBlobRepository, SqliteAttachmentReferenceRepository, SqliteEncryptionMetadataRepository,
        SqliteNoteRepository, SqliteSyncMetadataRepository,
    };
    use jottery_domain::value_objects::SyncStatus;
    use tempfile::NamedTempFile;

    async fn test_service() -> (NoteService, KeyManager, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();

        let key_manager = KeyManager::new();
        let salt = cipher::random_salt().unwrap();
        let key = cipher::derive("hunter2", &salt, 1000).unwrap();
        key_manager.initialize(key).unwrap();

        let service = NoteService::new(
            Arc::new(SqliteNoteRepository::new(pool.clone())),
            Arc::new(SqliteAttachmentBlobRepository::new(pool.clone())),
            Arc::new(SqliteAttachmentReferenceRepository::new(pool.clone())),
            Arc::new(SqliteSyncMetadataRepository::new(pool.clone())),
            Arc::new(SqliteEncryptionMetadataRepository::new(pool)),
            key_manager.clone(),
        );
        (service, key_manager, temp)
    }

    #[tokio::test]
    async fn create_then_get_round_trips_content_and_tags() {
        let (service, _key_manager, _temp) = test_service().await;
        let created = service
            .create(CreateNoteInput {
                content: "hello world".into(),
                tags: vec!["Work".into(), "work".into(), " urgent ".into()],
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(created.tags, vec!["Work".to_string(), "urgent".to_string()]);

        let fetched = service.get(created.id).await.unwrap();
        assert_eq!(fetched.content, "hello world");
        assert_eq!(fetched.version, 1);
    }

    #[tokio::test]
    async fn create_fails_closed_when_locked() {
        let (service, key_manager, _temp) = test_service().await;
        key_manager.lock();
        let result = service.create(CreateNoteInput::default()).await;
        assert!(matches!(result, Err(JotteryError::Locked)));
    }

    #[tokio::test]
    async fn update_re_encrypts_content_and_bumps_version() {
        let (service, _key_manager, _temp) = test_service().await;
        let created = service
            .create(CreateNoteInput {
                content: "first draft".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = service
            .update(
                created.id,
                UpdateNoteInput {
                    content: Some("second draft".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.content, "second draft");
        assert_eq!(updated.version, 2);
    }

    #[tokio::test]
    async fn every_mutation_marks_the_note_pending() {
        let (service, _key_manager, temp) = test_service().await;
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();
        let sync_metadata = SqliteSyncMetadataRepository::new(pool);

        let created = service.create(CreateNoteInput::default()).await.unwrap();
        let status = sync_metadata.get_note(created.id).await.unwrap().unwrap().status;
        assert_eq!(status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn soft_delete_then_restore_round_trips() {
        let (service, _key_manager, _temp) = test_service().await;
        let created = service.create(CreateNoteInput::default()).await.unwrap();

        service.soft_delete(created.id).await.unwrap();
        let deleted = service.get(created.id).await.unwrap();
        assert!(deleted.deleted);

        service.restore(created.id).await.unwrap();
        let restored = service.get(created.id).await.unwrap();
        assert!(!restored.deleted);
    }

    #[tokio::test]
    async fn permanent_delete_is_idempotent() {
        let (service, _key_manager, _temp) = test_service().await;
        let created = service.create(CreateNoteInput::default()).await.unwrap();

        service.permanent_delete(created.id).await.unwrap();
        assert!(matches!(service.get(created.id).await, Err(JotteryError::NotFound(_))));

        // Second call against an already-purged id must not error.
        service.permanent_delete(created.id).await.unwrap();
    }

    #[tokio::test]
    async fn purge_old_removes_only_notes_past_the_retention_window() {
        let (service, _key_manager, temp) = test_service().await;
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();

        let old = service.create(CreateNoteInput::default()).await.unwrap();
        service.soft_delete(old.id).await.unwrap();
        sqlx::query("UPDATE notes SET deleted_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::days(31))
            .bind(old.id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let recent = service.create(CreateNoteInput::default()).await.unwrap();
        service.soft_delete(recent.id).await.unwrap();

        let purged = service.purge_old(None).await.unwrap();
        assert_eq!(purged, 1);
        assert!(matches!(service.get(old.id).await, Err(JotteryError::NotFound(_))));
        assert!(service.get(recent.id).await.is_ok());
    }

    #[tokio::test]
    async fn alpha_sort_orders_by_case_folded_first_line_with_pinned_first() {
        let (service, _key_manager, _temp) = test_service().await;
        service
            .create(CreateNoteInput { content: "Zebra".into(), ..Default::default() })
            .await
            .unwrap();
        service
            .create(CreateNoteInput { content: "apple".into(), ..Default::default() })
            .await
            .unwrap();
        let pinned = service
            .create(CreateNoteInput { content: "Middle".into(), ..Default::default() })
            .await
            .unwrap();
        service.toggle_pin(pinned.id).await.unwrap();

        let listed = service
            .list(NoteFilter {
                sort: SortOrder::Alpha,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(listed[0].content, "Middle");
        assert_eq!(listed[1].content, "apple");
        assert_eq!(listed[2].content, "Zebra");
    }

    #[tokio::test]
    async fn wipe_store_removes_every_note_and_locks_the_key_manager() {
        let (service, key_manager, _temp) = test_service().await;
        let note = service.create(CreateNoteInput { content: "secret".into(), ..Default::default() }).await.unwrap();

        service.wipe_store().await.unwrap();

        assert!(matches!(service.get(note.id).await, Err(JotteryError::Locked)));
        assert!(key_manager.current_key().is_none());
    }
}
