// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`EncryptionMetadataRepository`].
//!
//! Import (§4.4) is the one case that overwrites this row after the store
//! was already initialized; it goes through [`EncryptionMetadataRepository::initialize`]
//! too, since that call is how the storage layer enforces the singleton,
//! not through a separate "overwrite" method. Import callers in the
//! application layer delete the existing row first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jottery_domain::entities::EncryptionMetadata;
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::EncryptionMetadataRepository;
use sqlx::{Row, SqlitePool};

pub struct SqliteEncryptionMetadataRepository {
    pool: SqlitePool,
}

impl SqliteEncryptionMetadataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> JotteryError {
    JotteryError::StorageUnavailable(e.to_string())
}

#[async_trait]
impl EncryptionMetadataRepository for SqliteEncryptionMetadataRepository {
    async fn get(&self) -> Result<Option<EncryptionMetadata>, JotteryError> {
        let row = sqlx::query("SELECT salt, iterations, created_at, algorithm FROM encryption_metadata WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some(EncryptionMetadata {
            salt: row.try_get("salt").map_err(db_err)?,
            iterations: row.try_get::<i64, _>("iterations").map_err(db_err)? as u32,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(db_err)?,
            algorithm: row.try_get("algorithm").map_err(db_err)?,
        }))
    }

    async fn initialize(&self, metadata: &EncryptionMetadata) -> Result<(), JotteryError> {
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM encryption_metadata WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(JotteryError::AlreadyInitialized);
        }

        sqlx::query("INSERT INTO encryption_metadata (id, salt, iterations, created_at, algorithm) VALUES (1, ?, ?, ?, ?)")
            .bind(&metadata.salt)
            .bind(metadata.iterations as i64)
            .bind(metadata.created_at)
            .bind(&metadata.algorithm)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM encryption_metadata WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_client_database;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn initialize_then_get_round_trips() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();
        let repo = SqliteEncryptionMetadataRepository::new(pool);

        let metadata = EncryptionMetadata::new(vec![1, 2, 3, 4]);
        repo.initialize(&metadata).await.unwrap();

        let fetched = repo.get().await.unwrap().unwrap();
        assert_eq!(fetched.salt, vec![1, 2, 3, 4]);
        assert_eq!(fetched.iterations, EncryptionMetadata::DEFAULT_ITERATIONS);
    }

    #[tokio::test]
    async fn a_second_initialize_without_clearing_fails() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();
        let repo = SqliteEncryptionMetadataRepository::new(pool);

        repo.initialize(&EncryptionMetadata::new(vec![1])).await.unwrap();
        let result = repo.initialize(&EncryptionMetadata::new(vec![2])).await;
        assert!(matches!(result, Err(JotteryError::AlreadyInitialized)));
    }

    #[tokio::test]
    async fn clear_then_initialize_replaces_the_salt() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_client_database(&db_url).await.unwrap();
        let repo = SqliteEncryptionMetadataRepository::new(pool);

        repo.initialize(&EncryptionMetadata::new(vec![1])).await.unwrap();
        repo.clear().await.unwrap();
        repo.initialize(&EncryptionMetadata::new(vec![9, 9])).await.unwrap();

        let fetched = repo.get().await.unwrap().unwrap();
        assert_eq!(fetched.salt, vec![9, 9]);
    }
}
