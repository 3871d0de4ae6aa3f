// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`ServerNoteRepository`].
//!
//! [`SqliteServerNoteRepository::try_push`] is the only write path that
//! needs same-row serialization against itself: it opens the connection's
//! transaction with `BEGIN IMMEDIATE`, which takes SQLite's RESERVED lock
//! before the read happens, so no other writer can start its own write
//! transaction until this one commits or rolls back. The read, the
//! last-write-wins comparison, and the conditional write are therefore
//! indivisible from every other caller's point of view — a second
//! concurrent push for the same row blocks until the first's transaction
//! ends, rather than racing it. `upsert` carries no such guarantee; it is
//! for unconditional writes only (see its own doc comment).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jottery_domain::entities::ServerNote;
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::ServerNoteRepository;
use jottery_domain::value_objects::{AttachmentId, ClientId, NoteId};
use sqlx::{Row, SqlitePool};

pub struct SqliteServerNoteRepository {
    pool: SqlitePool,
}

impl SqliteServerNoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> JotteryError {
    JotteryError::StorageUnavailable(e.to_string())
}

fn row_to_server_note(row: &sqlx::sqlite::SqliteRow) -> Result<ServerNote, JotteryError> {
    let client_id: String = row.try_get("client_id").map_err(db_err)?;
    let note_id: String = row.try_get("note_id").map_err(db_err)?;
    let attachments_json: String = row.try_get("attachments").map_err(db_err)?;
    let attachments: Vec<AttachmentId> = serde_json::from_str(&attachments_json)
        .map_err(|e| JotteryError::InternalError(format!("corrupt attachments column: {e}")))?;
    let content_hash: Option<Vec<u8>> = row.try_get("content_hash").map_err(db_err)?;

    Ok(ServerNote {
        client_id: client_id.parse().map_err(|e| JotteryError::InternalError(format!("corrupt client id: {e}")))?,
        note_id: note_id.parse().map_err(|e| JotteryError::InternalError(format!("corrupt note id: {e}")))?,
        content_ciphertext: row.try_get("content_ciphertext").map_err(db_err)?,
        content_iv: row.try_get("content_iv").map_err(db_err)?,
        tags_ciphertext: row.try_get("tags_ciphertext").map_err(db_err)?,
        tags_iv: row.try_get("tags_iv").map_err(db_err)?,
        attachments,
        pinned: row.try_get::<i64, _>("pinned").map_err(db_err)? != 0,
        word_wrap: row.try_get::<i64, _>("word_wrap").map_err(db_err)? != 0,
        syntax_language: row.try_get("syntax_language").map_err(db_err)?,
        content_hash: content_hash.map(|bytes| {
            let mut out = [0u8; 32];
            let len = bytes.len().min(32);
            out[..len].copy_from_slice(&bytes[..len]);
            out
        }),
        client_modified_at: row.try_get::<DateTime<Utc>, _>("client_modified_at").map_err(db_err)?,
        client_version: row.try_get::<i64, _>("client_version").map_err(db_err)? as u64,
        server_version: row.try_get::<i64, _>("server_version").map_err(db_err)? as u64,
        server_modified_at: row.try_get::<DateTime<Utc>, _>("server_modified_at").map_err(db_err)?,
        deleted: row.try_get::<i64, _>("deleted").map_err(db_err)? != 0,
        deleted_at: row.try_get::<Option<DateTime<Utc>>, _>("deleted_at").map_err(db_err)?,
    })
}

#[async_trait]
impl ServerNoteRepository for SqliteServerNoteRepository {
    async fn get(&self, client_id: ClientId, note_id: NoteId) -> Result<Option<ServerNote>, JotteryError> {
        let row = sqlx::query("SELECT * FROM notes WHERE client_id = ? AND note_id = ?")
            .bind(client_id.to_string())
            .bind(note_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_server_note).transpose()
    }

    async fn list_since(
        &self,
        client_id: ClientId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ServerNote>, JotteryError> {
        let rows = match since {
            Some(since) => {
                sqlx::query("SELECT * FROM notes WHERE client_id = ? AND server_modified_at > ?")
                    .bind(client_id.to_string())
                    .bind(since)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM notes WHERE client_id = ?")
                    .bind(client_id.to_string())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_err)?;

        rows.iter().map(row_to_server_note).collect()
    }

    async fn upsert(&self, note: &ServerNote) -> Result<u64, JotteryError> {
        let attachments_json =
            serde_json::to_string(&note.attachments).map_err(|e| JotteryError::InternalError(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO notes (
                client_id, note_id, content_ciphertext, content_iv, tags_ciphertext, tags_iv,
                attachments, pinned, word_wrap, syntax_language, content_hash,
                client_modified_at, client_version, server_version, server_modified_at,
                deleted, deleted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (client_id, note_id) DO UPDATE SET
                content_ciphertext = excluded.content_ciphertext,
                content_iv = excluded.content_iv,
                tags_ciphertext = excluded.tags_ciphertext,
                tags_iv = excluded.tags_iv,
                attachments = excluded.attachments,
                pinned = excluded.pinned,
                word_wrap = excluded.word_wrap,
                syntax_language = excluded.syntax_language,
                content_hash = excluded.content_hash,
                client_modified_at = excluded.client_modified_at,
                client_version = excluded.client_version,
                server_version = excluded.server_version,
                server_modified_at = excluded.server_modified_at,
                deleted = excluded.deleted,
                deleted_at = excluded.deleted_at
            "#,
        )
        .bind(note.client_id.to_string())
        .bind(note.note_id.to_string())
        .bind(&note.content_ciphertext)
        .bind(&note.content_iv)
        .bind(&note.tags_ciphertext)
        .bind(&note.tags_iv)
        .bind(attachments_json)
        .bind(note.pinned)
        .bind(note.word_wrap)
        .bind(&note.syntax_language)
        .bind(note.content_hash.map(|h| h.to_vec()))
        .bind(note.client_modified_at)
        .bind(note.client_version as i64)
        .bind(note.server_version as i64)
        .bind(note.server_modified_at)
        .bind(note.deleted)
        .bind(note.deleted_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(note.server_version)
    }

    async fn try_push(&self, note: &ServerNote) -> Result<Option<ServerNote>, JotteryError> {
        let attachments_json =
            serde_json::to_string(&note.attachments).map_err(|e| JotteryError::InternalError(e.to_string()))?;

        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await.map_err(db_err)?;

        let existing_row = sqlx::query("SELECT * FROM notes WHERE client_id = ? AND note_id = ?")
            .bind(note.client_id.to_string())
            .bind(note.note_id.to_string())
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_err)?;
        let existing = match existing_row.as_ref().map(row_to_server_note).transpose() {
            Ok(existing) => existing,
            Err(e) => {
                sqlx::query("ROLLBACK").execute(&mut *conn).await.ok();
                return Err(e);
            }
        };

        let should_accept = match &existing {
            None => true,
            Some(existing) => existing.should_accept(note.client_modified_at),
        };
        if !should_accept {
            sqlx::query("ROLLBACK").execute(&mut *conn).await.map_err(db_err)?;
            return Ok(None);
        }

        let server_modified_at = Utc::now();
        let next_version = existing.as_ref().map(|e| e.server_version + 1).unwrap_or(1);

        let write_result = sqlx::query(
            r#"
            INSERT INTO notes (
                client_id, note_id, content_ciphertext, content_iv, tags_ciphertext, tags_iv,
                attachments, pinned, word_wrap, syntax_language, content_hash,
                client_modified_at, client_version, server_version, server_modified_at,
                deleted, deleted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (client_id, note_id) DO UPDATE SET
                content_ciphertext = excluded.content_ciphertext,
                content_iv = excluded.content_iv,
                tags_ciphertext = excluded.tags_ciphertext,
                tags_iv = excluded.tags_iv,
                attachments = excluded.attachments,
                pinned = excluded.pinned,
                word_wrap = excluded.word_wrap,
                syntax_language = excluded.syntax_language,
                content_hash = excluded.content_hash,
                client_modified_at = excluded.client_modified_at,
                client_version = excluded.client_version,
                server_version = excluded.server_version,
                server_modified_at = excluded.server_modified_at,
                deleted = excluded.deleted,
                deleted_at = excluded.deleted_at
            "#,
        )
        .bind(note.client_id.to_string())
        .bind(note.note_id.to_string())
        .bind(&note.content_ciphertext)
        .bind(&note.content_iv)
        .bind(&note.tags_ciphertext)
        .bind(&note.tags_iv)
        .bind(attachments_json)
        .bind(note.pinned)
        .bind(note.word_wrap)
        .bind(&note.syntax_language)
        .bind(note.content_hash.map(|h| h.to_vec()))
        .bind(note.client_modified_at)
        .bind(note.client_version as i64)
        .bind(next_version as i64)
        .bind(server_modified_at)
        .bind(note.deleted)
        .bind(note.deleted_at)
        .execute(&mut *conn)
        .await;

        if let Err(e) = write_result {
            sqlx::query("ROLLBACK").execute(&mut *conn).await.ok();
            return Err(db_err(e));
        }

        sqlx::query("COMMIT").execute(&mut *conn).await.map_err(db_err)?;

        Ok(Some(ServerNote {
            server_version: next_version,
            server_modified_at,
            ..note.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_server_database;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn sample_note(client_id: ClientId) -> ServerNote {
        let now = Utc::now();
        ServerNote {
            client_id,
            note_id: NoteId::new(),
            content_ciphertext: "cipher".into(),
            content_iv: "iv".into(),
            tags_ciphertext: "tagcipher".into(),
            tags_iv: "tagiv".into(),
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

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        let repo = SqliteServerNoteRepository::new(pool);

        let client_id = ClientId::new();
        let note = sample_note(client_id);
        let version = repo.upsert(&note).await.unwrap();
        assert_eq!(version, 1);

        let fetched = repo.get(client_id, note.note_id).await.unwrap().unwrap();
        assert_eq!(fetched.content_ciphertext, "cipher");
    }

    #[tokio::test]
    async fn a_second_upsert_with_higher_server_version_overwrites_the_row() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        let repo = SqliteServerNoteRepository::new(pool);

        let client_id = ClientId::new();
        let mut note = sample_note(client_id);
        repo.upsert(&note).await.unwrap();

        note.server_version = 2;
        note.content_ciphertext = "cipher-v2".into();
        repo.upsert(&note).await.unwrap();

        let fetched = repo.get(client_id, note.note_id).await.unwrap().unwrap();
        assert_eq!(fetched.server_version, 2);
        assert_eq!(fetched.content_ciphertext, "cipher-v2");
    }

    #[tokio::test]
    async fn list_since_only_returns_notes_newer_than_the_cutoff() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        let repo = SqliteServerNoteRepository::new(pool);

        let client_id = ClientId::new();
        let note = sample_note(client_id);
        let cutoff = note.server_modified_at;
        repo.upsert(&note).await.unwrap();

        let nothing_newer = repo.list_since(client_id, Some(cutoff)).await.unwrap();
        assert!(nothing_newer.is_empty());

        let everything = repo.list_since(client_id, None).await.unwrap();
        assert_eq!(everything.len(), 1);
    }

    #[tokio::test]
    async fn try_push_assigns_version_one_to_the_first_write() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        let repo = SqliteServerNoteRepository::new(pool);

        let client_id = ClientId::new();
        let note = sample_note(client_id);
        let accepted = repo.try_push(&note).await.unwrap().unwrap();
        assert_eq!(accepted.server_version, 1);
    }

    #[tokio::test]
    async fn try_push_rejects_a_push_older_than_the_stored_row() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        let repo = SqliteServerNoteRepository::new(pool);

        let client_id = ClientId::new();
        let mut note = sample_note(client_id);
        repo.try_push(&note).await.unwrap();

        note.client_modified_at -= chrono::Duration::seconds(5);
        note.content_ciphertext = "stale".into();
        let rejected = repo.try_push(&note).await.unwrap();
        assert!(rejected.is_none());

        let stored = repo.get(client_id, note.note_id).await.unwrap().unwrap();
        assert_eq!(stored.server_version, 1);
        assert_eq!(stored.content_ciphertext, "cipher");
    }

    #[tokio::test]
    async fn try_push_accepts_and_bumps_the_version_on_a_strictly_newer_push() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        let repo = SqliteServerNoteRepository::new(pool);

        let client_id = ClientId::new();
        let mut note = sample_note(client_id);
        repo.try_push(&note).await.unwrap();

        note.client_modified_at += chrono::Duration::seconds(5);
        note.content_ciphertext = "fresher".into();
        let accepted = repo.try_push(&note).await.unwrap().unwrap();
        assert_eq!(accepted.server_version, 2);

        let stored = repo.get(client_id, note.note_id).await.unwrap().unwrap();
        assert_eq!(stored.content_ciphertext, "fresher");
    }

    #[tokio::test]
    async fn only_one_of_two_concurrent_pushes_for_the_same_row_is_accepted() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        let repo = Arc::new(SqliteServerNoteRepository::new(pool));

        let client_id = ClientId::new();
        let base = sample_note(client_id);
        repo.try_push(&base).await.unwrap();

        let mut first = base.clone();
        first.client_modified_at += chrono::Duration::seconds(1);
        let mut second = base.clone();
        second.client_modified_at += chrono::Duration::seconds(1);

        let repo_a = repo.clone();
        let repo_b = repo.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move { repo_a.try_push(&first).await.unwrap() }),
            tokio::spawn(async move { repo_b.try_push(&second).await.unwrap() }),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let accepted_count = [&a, &b].iter().filter(|r| r.is_some()).count();
        assert_eq!(accepted_count, 1);

        let stored = repo.get(client_id, base.note_id).await.unwrap().unwrap();
        assert_eq!(stored.server_version, 2);
    }
}
