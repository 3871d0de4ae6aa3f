// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`ServerAttachmentRepository`].

use async_trait::async_trait;
use jottery_domain::entities::ServerAttachment;
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::ServerAttachmentRepository;
use jottery_domain::value_objects::{ClientId, NoteId};
use sqlx::{Row, SqlitePool};

pub struct SqliteServerAttachmentRepository {
    pool: SqlitePool,
}

impl SqliteServerAttachmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> JotteryError {
    JotteryError::StorageUnavailable(e.to_string())
}

fn row_to_attachment(row: &sqlx::sqlite::SqliteRow) -> Result<ServerAttachment, JotteryError> {
    let attachment_id: String = row.try_get("attachment_id").map_err(db_err)?;
    let client_id: String = row.try_get("client_id").map_err(db_err)?;
    let note_id: String = row.try_get("note_id").map_err(db_err)?;

    Ok(ServerAttachment {
        id: attachment_id
            .parse()
            .map_err(|e| JotteryError::InternalError(format!("corrupt attachment id: {e}")))?,
        client_id: client_id
            .parse()
            .map_err(|e| JotteryError::InternalError(format!("corrupt client id: {e}")))?,
        note_id: note_id
            .parse()
            .map_err(|e| JotteryError::InternalError(format!("corrupt note id: {e}")))?,
        blob: row.try_get("blob").map_err(db_err)?,
        filename_ciphertext: row.try_get("filename_ciphertext").map_err(db_err)?,
        filename_iv: row.try_get("filename_iv").map_err(db_err)?,
        mime_type: row.try_get("mime_type").map_err(db_err)?,
        size_bytes: row.try_get::<i64, _>("size_bytes").map_err(db_err)? as u64,
    })
}

#[async_trait]
impl ServerAttachmentRepository for SqliteServerAttachmentRepository {
    async fn put(&self, attachment: &ServerAttachment) -> Result<(), JotteryError> {
        sqlx::query(
            r#"
            INSERT INTO attachments (
                attachment_id, client_id, note_id, blob,
                filename_ciphertext, filename_iv, mime_type, size_bytes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (attachment_id) DO UPDATE SET
                client_id = excluded.client_id,
                note_id = excluded.note_id,
                blob = excluded.blob,
                filename_ciphertext = excluded.filename_ciphertext,
                filename_iv = excluded.filename_iv,
                mime_type = excluded.mime_type,
                size_bytes = excluded.size_bytes
            "#,
        )
        .bind(attachment.id.to_string())
        .bind(attachment.client_id.to_string())
        .bind(attachment.note_id.to_string())
        .bind(&attachment.blob)
        .bind(&attachment.filename_ciphertext)
        .bind(&attachment.filename_iv)
        .bind(&attachment.mime_type)
        .bind(attachment.size_bytes as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get_for_notes(&self, client_id: ClientId, note_ids: &[NoteId]) -> Result<Vec<ServerAttachment>, JotteryError> {
        if note_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = note_ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT * FROM attachments WHERE client_id = ? AND note_id IN ({placeholders})");
        let mut query = sqlx::query(&sql).bind(client_id.to_string());
        for note_id in note_ids {
            query = query.bind(note_id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_attachment).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_server_database;
    use jottery_domain::value_objects::AttachmentId;
    use tempfile::NamedTempFile;

    async fn test_repo() -> (SqliteServerAttachmentRepository, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        (SqliteServerAttachmentRepository::new(pool), temp)
    }

    fn sample(client_id: ClientId, note_id: NoteId) -> ServerAttachment {
        ServerAttachment {
            id: AttachmentId::new(),
            client_id,
            note_id,
            blob: b"ciphertext bytes".to_vec(),
            filename_ciphertext: "cipher".into(),
            filename_iv: "iv".into(),
            mime_type: "image/png".into(),
            size_bytes: 17,
        }
    }

    #[tokio::test]
    async fn get_for_notes_returns_only_attachments_for_the_requested_notes_and_client() {
        let (repo, _temp) = test_repo().await;
        let client_id = ClientId::new();
        let other_client = ClientId::new();
        let note_id = NoteId::new();
        let other_note = NoteId::new();

        let wanted = sample(client_id, note_id);
        let wrong_note = sample(client_id, other_note);
        let wrong_client = sample(other_client, note_id);
        repo.put(&wanted).await.unwrap();
        repo.put(&wrong_note).await.unwrap();
        repo.put(&wrong_client).await.unwrap();

        let fetched = repo.get_for_notes(client_id, &[note_id]).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, wanted.id);
        assert_eq!(fetched[0].blob, b"ciphertext bytes");
    }

    #[tokio::test]
    async fn put_twice_overwrites_the_blob() {
        let (repo, _temp) = test_repo().await;
        let client_id = ClientId::new();
        let note_id = NoteId::new();
        let mut attachment = sample(client_id, note_id);
        repo.put(&attachment).await.unwrap();

        attachment.blob = b"new bytes".to_vec();
        repo.put(&attachment).await.unwrap();

        let fetched = repo.get_for_notes(client_id, &[note_id]).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].blob, b"new bytes");
    }
}
