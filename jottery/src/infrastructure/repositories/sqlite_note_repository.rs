// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`NoteRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jottery_domain::entities::Note;
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::{NoteFilter, NoteRepository};
use jottery_domain::value_objects::{AttachmentId, NoteId, SortOrder};
use sqlx::{Row, SqlitePool};

pub struct SqliteNoteRepository {
    pool: SqlitePool,
}

impl SqliteNoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_note(row: &sqlx::sqlite::SqliteRow) -> Result<Note, JotteryError> {
    let id: String = row.try_get("id").map_err(db_err)?;
    let attachments_json: String = row.try_get("attachments").map_err(db_err)?;
    let attachments: Vec<AttachmentId> = serde_json::from_str(&attachments_json)
        .map_err(|e| JotteryError::InternalError(format!("corrupt attachments column: {e}")))?;
    let content_hash: Option<Vec<u8>> = row.try_get("content_hash").map_err(db_err)?;

    Ok(Note {
        id: id.parse().map_err(|e| JotteryError::InternalError(format!("corrupt note id: {e}")))?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(db_err)?,
        modified_at: row.try_get::<DateTime<Utc>, _>("modified_at").map_err(db_err)?,
        synced_at: row.try_get::<Option<DateTime<Utc>>, _>("synced_at").map_err(db_err)?,
        content_ciphertext: row.try_get("content_ciphertext").map_err(db_err)?,
        content_iv: row.try_get("content_iv").map_err(db_err)?,
        tags_ciphertext: row.try_get("tags_ciphertext").map_err(db_err)?,
        tags_iv: row.try_get("tags_iv").map_err(db_err)?,
        attachments,
        pinned: row.try_get::<i64, _>("pinned").map_err(db_err)? != 0,
        deleted: row.try_get::<i64, _>("deleted").map_err(db_err)? != 0,
        deleted_at: row.try_get::<Option<DateTime<Utc>>, _>("deleted_at").map_err(db_err)?,
        content_hash: content_hash.map(|bytes| {
            let mut out = [0u8; 32];
            let len = bytes.len().min(32);
            out[..len].copy_from_slice(&bytes[..len]);
            out
        }),
        version: row.try_get::<i64, _>("version").map_err(db_err)? as u64,
        word_wrap: row.try_get::<i64, _>("word_wrap").map_err(db_err)? != 0,
        syntax_language: row.try_get("syntax_language").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> JotteryError {
    JotteryError::StorageUnavailable(e.to_string())
}

#[async_trait]
impl NoteRepository for SqliteNoteRepository {
    async fn insert(&self, note: &Note) -> Result<(), JotteryError> {
        let attachments_json = serde_json::to_string(&note.attachments)
            .map_err(|e| JotteryError::InternalError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO notes (
                id, created_at, modified_at, synced_at,
                content_ciphertext, content_iv, tags_ciphertext, tags_iv,
                attachments, pinned, deleted, deleted_at, content_hash,
                version, word_wrap, syntax_language
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(note.id.to_string())
        .bind(note.created_at)
        .bind(note.modified_at)
        .bind(note.synced_at)
        .bind(&note.content_ciphertext)
        .bind(&note.content_iv)
        .bind(&note.tags_ciphertext)
        .bind(&note.tags_iv)
        .bind(attachments_json)
        .bind(note.pinned)
        .bind(note.deleted)
        .bind(note.deleted_at)
        .bind(note.content_hash.map(|h| h.to_vec()))
        .bind(note.version as i64)
        .bind(note.word_wrap)
        .bind(&note.syntax_language)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get(&self, id: NoteId) -> Result<Option<Note>, JotteryError> {
        let row = sqlx::query("SELECT * FROM notes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(row_to_note).transpose()
    }

    async fn get_by_ids(&self, ids: &[NoteId]) -> Result<Vec<Note>, JotteryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = std::iter::repeat("?").take(ids.len()).collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT * FROM notes WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }

        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_note).collect()
    }

    async fn update(&self, note: &Note) -> Result<(), JotteryError> {
        let attachments_json = serde_json::to_string(&note.attachments)
            .map_err(|e| JotteryError::InternalError(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE notes SET
                modified_at = ?, synced_at = ?,
                content_ciphertext = ?, content_iv = ?, tags_ciphertext = ?, tags_iv = ?,
                attachments = ?, pinned = ?, deleted = ?, deleted_at = ?, content_hash = ?,
                version = ?, word_wrap = ?, syntax_language = ?
            WHERE id = ?
            "#,
        )
        .bind(note.modified_at)
        .bind(note.synced_at)
        .bind(&note.content_ciphertext)
        .bind(&note.content_iv)
        .bind(&note.tags_ciphertext)
        .bind(&note.tags_iv)
        .bind(attachments_json)
        .bind(note.pinned)
        .bind(note.deleted)
        .bind(note.deleted_at)
        .bind(note.content_hash.map(|h| h.to_vec()))
        .bind(note.version as i64)
        .bind(note.word_wrap)
        .bind(&note.syntax_language)
        .bind(note.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(JotteryError::NotFound(note.id.to_string()));
        }
        Ok(())
    }

    async fn touch(&self, id: NoteId) -> Result<(), JotteryError> {
        let result = sqlx::query("UPDATE notes SET modified_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(JotteryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// A no-op, not a [`JotteryError::NotFound`], if `note_id` is no
    /// longer present: the note may have been purged locally between this
    /// push going out and the server's acceptance coming back.
    async fn mark_synced(&self, note_id: NoteId, synced_at: DateTime<Utc>) -> Result<(), JotteryError> {
        sqlx::query("UPDATE notes SET synced_at = ? WHERE id = ?")
            .bind(synced_at)
            .bind(note_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list(&self, filter: &NoteFilter) -> Result<Vec<Note>, JotteryError> {
        let mut sql = String::from("SELECT * FROM notes WHERE 1 = 1");
        if !filter.include_deleted {
            sql.push_str(" AND deleted = 0");
        }
        if filter.pinned_only {
            sql.push_str(" AND pinned = 1");
        }
        // `alpha` sorts on decrypted content, which this repository never
        // sees; the note service applies that ordering after decryption.
        // Everything else can be pushed down to the index-backed column.
        sql.push_str(" ORDER BY pinned DESC, ");
        sql.push_str(match filter.sort {
            SortOrder::Recent => "modified_at DESC",
            SortOrder::Oldest => "modified_at ASC",
            SortOrder::Created => "created_at DESC",
            SortOrder::Alpha => "modified_at DESC",
        });

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_note).collect()
    }

    async fn count_active(&self) -> Result<u64, JotteryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE deleted = 0")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count as u64)
    }

    async fn count_deleted(&self) -> Result<u64, JotteryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE deleted = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count as u64)
    }

    async fn soft_delete(&self, id: NoteId) -> Result<(), JotteryError> {
        let result = sqlx::query(
            "UPDATE notes SET deleted = 1, deleted_at = ?, modified_at = ?, version = version + 1 WHERE id = ? AND deleted = 0",
        )
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(JotteryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn restore(&self, id: NoteId) -> Result<(), JotteryError> {
        let result = sqlx::query(
            "UPDATE notes SET deleted = 0, deleted_at = NULL, modified_at = ?, version = version + 1 WHERE id = ? AND deleted = 1",
        )
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(JotteryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn purge(&self, id: NoteId) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, JotteryError> {
        let result = sqlx::query("DELETE FROM notes WHERE deleted = 1 AND deleted_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn list_modified_after(&self, since: DateTime<Utc>) -> Result<Vec<Note>, JotteryError> {
        let rows = sqlx::query("SELECT * FROM notes WHERE modified_at > ? ORDER BY modified_at ASC")
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_note).collect()
    }

    async fn delete_all(&self) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM notes").execute(&self.pool).await.map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_client_database;
    use chrono::Duration;
    use tempfile::NamedTempFile;

    async fn test_repo() -> (SqliteNoteRepository, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();
        (SqliteNoteRepository::new(pool), temp)
    }

    fn sample_note() -> Note {
        let now = Utc::now();
        Note {
            id: NoteId::new(),
            created_at: now,
            modified_at: now,
            synced_at: None,
            content_ciphertext: "cipher".into(),
            content_iv: "iv".into(),
            tags_ciphertext: "tagcipher".into(),
            tags_iv: "tagiv".into(),
            attachments: Vec::new(),
            pinned: false,
            deleted: false,
            deleted_at: None,
            content_hash: Some([7u8; 32]),
            version: 1,
            word_wrap: true,
            syntax_language: Some("rust".into()),
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_every_field() {
        let (repo, _temp) = test_repo().await;
        let note = sample_note();
        repo.insert(&note).await.unwrap();

        let fetched = repo.get(note.id).await.unwrap().unwrap();
        assert_eq!(fetched.content_ciphertext, "cipher");
        assert_eq!(fetched.content_hash, Some([7u8; 32]));
        assert_eq!(fetched.syntax_language.as_deref(), Some("rust"));
    }

    #[tokio::test]
    async fn list_excludes_deleted_notes_by_default() {
        let (repo, _temp) = test_repo().await;
        let note = sample_note();
        repo.insert(&note).await.unwrap();
        repo.soft_delete(note.id).await.unwrap();

        let active = repo.list(&NoteFilter::default()).await.unwrap();
        assert!(active.is_empty());

        let all = repo
            .list(&NoteFilter {
                include_deleted: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].deleted);
    }

    #[tokio::test]
    async fn purge_older_than_removes_only_notes_past_the_cutoff() {
        let (repo, _temp) = test_repo().await;
        let old_note = sample_note();
        repo.insert(&old_note).await.unwrap();
        repo.soft_delete(old_note.id).await.unwrap();

        sqlx::query("UPDATE notes SET deleted_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::days(31))
            .bind(old_note.id.to_string())
            .execute(&repo.pool)
            .await
            .unwrap();

        let recent_note = sample_note();
        repo.insert(&recent_note).await.unwrap();
        repo.soft_delete(recent_note.id).await.unwrap();

        let purged = repo.purge_older_than(Utc::now() - Duration::days(30)).await.unwrap();
        assert_eq!(purged, 1);
        assert!(repo.get(old_note.id).await.unwrap().is_none());
        assert!(repo.get(recent_note.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_modified_after_excludes_notes_at_or_before_the_cutoff() {
        let (repo, _temp) = test_repo().await;
        let cutoff = Utc::now();

        let mut older = sample_note();
        older.modified_at = cutoff - Duration::seconds(10);
        repo.insert(&older).await.unwrap();

        let mut newer = sample_note();
        newer.modified_at = cutoff + Duration::seconds(10);
        repo.insert(&newer).await.unwrap();

        let changed = repo.list_modified_after(cutoff).await.unwrap();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].id, newer.id);
    }

    #[tokio::test]
    async fn pinned_notes_sort_before_unpinned() {
        let (repo, _temp) = test_repo().await;
        let mut unpinned = sample_note();
        unpinned.pinned = false;
        let mut pinned = sample_note();
        pinned.pinned = true;
        repo.insert(&unpinned).await.unwrap();
        repo.insert(&pinned).await.unwrap();

        let listed = repo.list(&NoteFilter::default()).await.unwrap();
        assert!(listed[0].pinned);
    }

    #[tokio::test]
    async fn get_by_ids_returns_only_the_notes_that_exist() {
        let (repo, _temp) = test_repo().await;
        let a = sample_note();
        let b = sample_note();
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let found = repo.get_by_ids(&[a.id, NoteId::new()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);

        assert!(repo.get_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn touch_bumps_modified_at_without_bumping_version() {
        let (repo, _temp) = test_repo().await;
        let note = sample_note();
        repo.insert(&note).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.touch(note.id).await.unwrap();

        let touched = repo.get(note.id).await.unwrap().unwrap();
        assert!(touched.modified_at > note.modified_at);
        assert_eq!(touched.version, note.version);
    }

    #[tokio::test]
    async fn mark_synced_stamps_synced_at_without_touching_version_or_modified_at() {
        let (repo, _temp) = test_repo().await;
        let note = sample_note();
        repo.insert(&note).await.unwrap();

        let synced_at = Utc::now();
        repo.mark_synced(note.id, synced_at).await.unwrap();

        let synced = repo.get(note.id).await.unwrap().unwrap();
        assert_eq!(synced.synced_at, Some(synced_at));
        assert_eq!(synced.version, note.version);
        assert_eq!(synced.modified_at, note.modified_at);
    }

    #[tokio::test]
    async fn mark_synced_on_a_missing_note_is_a_no_op_not_an_error() {
        let (repo, _temp) = test_repo().await;
        repo.mark_synced(NoteId::new(), Utc::now()).await.unwrap();
    }

    #[tokio::test]
    async fn count_active_and_count_deleted_reflect_soft_deletes() {
        let (repo, _temp) = test_repo().await;
        let kept = sample_note();
        let removed = sample_note();
        repo.insert(&kept).await.unwrap();
        repo.insert(&removed).await.unwrap();
        repo.soft_delete(removed.id).await.unwrap();

        assert_eq!(repo.count_active().await.unwrap(), 1);
        assert_eq!(repo.count_deleted().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_all_empties_the_table() {
        let (repo, _temp) = test_repo().await;
        repo.insert(&sample_note()).await.unwrap();
        repo.insert(&sample_note()).await.unwrap();

        repo.delete_all().await.unwrap();

        let remaining = repo
            .list(&NoteFilter {
                include_deleted: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }
}
