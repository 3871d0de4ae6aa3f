// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`AttachmentReferenceRepository`].

use async_trait::async_trait;
use jottery_domain::entities::AttachmentReference;
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::AttachmentReferenceRepository;
use jottery_domain::value_objects::AttachmentId;
use sqlx::{Row, SqlitePool};

pub struct SqliteAttachmentReferenceRepository {
    pool: SqlitePool,
}

impl SqliteAttachmentReferenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_reference(row: &sqlx::sqlite::SqliteRow) -> Result<AttachmentReference, JotteryError> {
    let id: String = row.try_get("id").map_err(db_err)?;
    Ok(AttachmentReference {
        id: id.parse().map_err(|e| JotteryError::InternalError(format!("corrupt attachment id: {e}")))?,
        filename_ciphertext: row.try_get("filename_ciphertext").map_err(db_err)?,
        filename_iv: row.try_get("filename_iv").map_err(db_err)?,
        mime_type: row.try_get("mime_type").map_err(db_err)?,
        size_bytes: row.try_get::<i64, _>("size_bytes").map_err(db_err)? as u64,
        blob_handle: row.try_get("blob_handle").map_err(db_err)?,
        thumbnail_handle: row.try_get("thumbnail_handle").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> JotteryError {
    JotteryError::StorageUnavailable(e.to_string())
}

#[async_trait]
impl AttachmentReferenceRepository for SqliteAttachmentReferenceRepository {
    async fn insert(&self, reference: &AttachmentReference) -> Result<(), JotteryError> {
        sqlx::query(
            r#"
            INSERT INTO attachment_refs (
                id, filename_ciphertext, filename_iv, mime_type, size_bytes, blob_handle, thumbnail_handle
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reference.id.to_string())
        .bind(&reference.filename_ciphertext)
        .bind(&reference.filename_iv)
        .bind(&reference.mime_type)
        .bind(reference.size_bytes as i64)
        .bind(&reference.blob_handle)
        .bind(&reference.thumbnail_handle)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn get(&self, id: AttachmentId) -> Result<Option<AttachmentReference>, JotteryError> {
        let row = sqlx::query("SELECT * FROM attachment_refs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(row_to_reference).transpose()
    }

    async fn get_by_ids(&self, ids: &[AttachmentId]) -> Result<Vec<AttachmentReference>, JotteryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT * FROM attachment_refs WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_reference).collect()
    }

    async fn update(&self, reference: &AttachmentReference) -> Result<(), JotteryError> {
        let result = sqlx::query(
            r#"
            UPDATE attachment_refs SET
                filename_ciphertext = ?, filename_iv = ?, mime_type = ?,
                size_bytes = ?, blob_handle = ?, thumbnail_handle = ?
            WHERE id = ?
            "#,
        )
        .bind(&reference.filename_ciphertext)
        .bind(&reference.filename_iv)
        .bind(&reference.mime_type)
        .bind(reference.size_bytes as i64)
        .bind(&reference.blob_handle)
        .bind(&reference.thumbnail_handle)
        .bind(reference.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(JotteryError::NotFound(reference.id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: AttachmentId) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM attachment_refs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM attachment_refs").execute(&self.pool).await.map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_client_database;
    use tempfile::NamedTempFile;

    async fn test_repo() -> (SqliteAttachmentReferenceRepository, NamedTempFile) {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();
        (SqliteAttachmentReferenceRepository::new(pool), temp)
    }

    fn sample_reference() -> AttachmentReference {
        AttachmentReference {
            id: AttachmentId::new(),
            filename_ciphertext: "cipher".into(),
            filename_iv: "iv".into(),
            mime_type: "image/png".into(),
            size_bytes: 1024,
            blob_handle: "blob-handle".into(),
            thumbnail_handle: None,
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips_every_field() {
        let (repo, _temp) = test_repo().await;
        let reference = sample_reference();
        repo.insert(&reference).await.unwrap();

        let fetched = repo.get(reference.id).await.unwrap().unwrap();
        assert_eq!(fetched.mime_type, "image/png");
        assert_eq!(fetched.size_bytes, 1024);
        assert_eq!(fetched.thumbnail_handle, None);
    }

    #[tokio::test]
    async fn get_by_ids_returns_only_the_requested_rows() {
        let (repo, _temp) = test_repo().await;
        let a = sample_reference();
        let b = sample_reference();
        let c = sample_reference();
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();
        repo.insert(&c).await.unwrap();

        let fetched = repo.get_by_ids(&[a.id, c.id]).await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert!(fetched.iter().any(|r| r.id == a.id));
        assert!(fetched.iter().any(|r| r.id == c.id));
        assert!(!fetched.iter().any(|r| r.id == b.id));
    }

    #[tokio::test]
    async fn update_changes_the_thumbnail_handle() {
        let (repo, _temp) = test_repo().await;
        let mut reference = sample_reference();
        repo.insert(&reference).await.unwrap();

        reference.thumbnail_handle = Some("thumb-handle".into());
        repo.update(&reference).await.unwrap();

        let fetched = repo.get(reference.id).await.unwrap().unwrap();
        assert_eq!(fetched.thumbnail_handle.as_deref(), Some("thumb-handle"));
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let (repo, _temp) = test_repo().await;
        let reference = sample_reference();
        repo.insert(&reference).await.unwrap();

        repo.delete(reference.id).await.unwrap();
        assert!(repo.get(reference.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_all_empties_the_table() {
        let (repo, _temp) = test_repo().await;
        repo.insert(&sample_reference()).await.unwrap();
        repo.insert(&sample_reference()).await.unwrap();

        repo.delete_all().await.unwrap();

        assert!(repo.get_by_ids(&[]).await.unwrap().is_empty());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attachment_refs")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
