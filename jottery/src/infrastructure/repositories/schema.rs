// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite schema helpers shared by the client and server repository
//! implementations.
//!
//! Applies migrations on start-up so the two binaries and integration
//! tests all see a consistent database. Migrations are additive; opening
//! an older store runs every migration newer than its current version.
//! Opening a store stamped with a `schema_version` newer than this build
//! understands is a hard, recoverable error rather than a silent
//! downgrade attempt.

use sqlx::migrate::MigrateDatabase;
use sqlx::SqlitePool;
use tracing::{debug, info};

use jottery_domain::JotteryError;

/// The highest `schema_version` this build knows how to read.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Creates the SQLite file if missing and runs embedded migrations for the
/// client-side local store.
pub async fn initialize_client_database(database_url: &str) -> Result<SqlitePool, JotteryError> {
    create_database_if_missing(database_url).await?;
    let pool = SqlitePool::connect(database_url)
        .await
        .map_err(|e| JotteryError::StorageUnavailable(e.to_string()))?;

    sqlx::migrate!("migrations")
        .run(&pool)
        .await
        .map_err(|e| JotteryError::StorageUnavailable(e.to_string()))?;

    check_schema_version(&pool).await?;
    info!("client database schema is up to date");
    Ok(pool)
}

/// Creates the SQLite file if missing and runs embedded migrations for the
/// server-side sync store.
pub async fn initialize_server_database(database_url: &str) -> Result<SqlitePool, JotteryError> {
    create_database_if_missing(database_url).await?;
    let pool = SqlitePool::connect(database_url)
        .await
        .map_err(|e| JotteryError::StorageUnavailable(e.to_string()))?;

    sqlx::migrate!("migrations_server")
        .run(&pool)
        .await
        .map_err(|e| JotteryError::StorageUnavailable(e.to_string()))?;

    check_schema_version(&pool).await?;
    info!("server database schema is up to date");
    Ok(pool)
}

async fn create_database_if_missing(database_url: &str) -> Result<(), JotteryError> {
    let exists = sqlx::Sqlite::database_exists(database_url)
        .await
        .map_err(|e| JotteryError::StorageUnavailable(e.to_string()))?;
    if !exists {
        debug!("database does not exist, creating: {}", database_url);
        sqlx::Sqlite::create_database(database_url)
            .await
            .map_err(|e| JotteryError::StorageUnavailable(e.to_string()))?;
    }
    Ok(())
}

async fn check_schema_version(pool: &SqlitePool) -> Result<(), JotteryError> {
    let found: i64 = sqlx::query_scalar("SELECT version FROM schema_version WHERE id = 1")
        .fetch_one(pool)
        .await
        .map_err(|e| JotteryError::StorageUnavailable(e.to_string()))?;

    if found > CURRENT_SCHEMA_VERSION {
        return Err(JotteryError::SchemaTooNew {
            found,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn initializing_the_client_database_creates_the_notes_table() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        drop(temp);

        let pool = initialize_client_database(&db_url).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='notes'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn initializing_the_server_database_creates_the_clients_table() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        drop(temp);

        let pool = initialize_server_database(&db_url).await.unwrap();
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='clients'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn a_schema_version_newer_than_this_build_is_a_hard_error() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        drop(temp);

        let pool = initialize_client_database(&db_url).await.unwrap();
        sqlx::query("UPDATE schema_version SET version = 999 WHERE id = 1")
            .execute(&pool)
            .await
            .unwrap();

        let result = check_schema_version(&pool).await;
        assert!(matches!(result, Err(JotteryError::SchemaTooNew { found: 999, .. })));
    }
}
