// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`AttachmentBlobRepository`].

use async_trait::async_trait;
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::AttachmentBlobRepository;
use sqlx::SqlitePool;

pub struct SqliteAttachmentBlobRepository {
    pool: SqlitePool,
}

impl SqliteAttachmentBlobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> JotteryError {
    JotteryError::StorageUnavailable(e.to_string())
}

#[async_trait]
impl AttachmentBlobRepository for SqliteAttachmentBlobRepository {
    async fn put(&self, ciphertext: &[u8]) -> Result<String, JotteryError> {
        let handle = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO attachment_blobs (handle, ciphertext) VALUES (?, ?)")
            .bind(&handle)
            .bind(ciphertext)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(handle)
    }

    async fn get(&self, handle: &str) -> Result<Option<Vec<u8>>, JotteryError> {
        sqlx::query_scalar("SELECT ciphertext FROM attachment_blobs WHERE handle = ?")
            .bind(handle)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn delete(&self, handle: &str) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM attachment_blobs WHERE handle = ?")
            .bind(handle)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn put_thumbnail(&self, ciphertext: &[u8]) -> Result<String, JotteryError> {
        let handle = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO thumbnail_blobs (handle, ciphertext) VALUES (?, ?)")
            .bind(&handle)
            .bind(ciphertext)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(handle)
    }

    async fn get_thumbnail(&self, handle: &str) -> Result<Option<Vec<u8>>, JotteryError> {
        sqlx::query_scalar("SELECT ciphertext FROM thumbnail_blobs WHERE handle = ?")
            .bind(handle)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn delete_thumbnail(&self, handle: &str) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM thumbnail_blobs WHERE handle = ?")
            .bind(handle)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM attachment_blobs").execute(&self.pool).await.map_err(db_err)?;
        sqlx::query("DELETE FROM thumbnail_blobs").execute(&self.pool).await.map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_client_database;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn put_then_get_round_trips_the_ciphertext() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();
        let repo = SqliteAttachmentBlobRepository::new(pool);

        let handle = repo.put(b"ciphertext bytes").await.unwrap();
        let fetched = repo.get(&handle).await.unwrap().unwrap();
        assert_eq!(fetched, b"ciphertext bytes");
    }

    #[tokio::test]
    async fn delete_removes_the_blob() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();
        let repo = SqliteAttachmentBlobRepository::new(pool);

        let handle = repo.put(b"data").await.unwrap();
        repo.delete(&handle).await.unwrap();
        assert!(repo.get(&handle).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_all_removes_every_blob_and_thumbnail() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();
        let repo = SqliteAttachmentBlobRepository::new(pool);

        let blob = repo.put(b"data").await.unwrap();
        let thumbnail = repo.put_thumbnail(b"thumb").await.unwrap();

        repo.delete_all().await.unwrap();

        assert!(repo.get(&blob).await.unwrap().is_none());
        assert!(repo.get_thumbnail(&thumbnail).await.unwrap().is_none());
    }
}
