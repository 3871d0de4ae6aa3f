// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`RegisteredClientRepository`], server side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jottery_domain::entities::RegisteredClient;
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::RegisteredClientRepository;
use jottery_domain::value_objects::ClientId;
use sqlx::{Row, SqlitePool};

pub struct SqliteRegisteredClientRepository {
    pool: SqlitePool,
}

impl SqliteRegisteredClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> JotteryError {
    JotteryError::StorageUnavailable(e.to_string())
}

fn row_to_client(row: &sqlx::sqlite::SqliteRow) -> Result<RegisteredClient, JotteryError> {
    let id: String = row.try_get("id").map_err(db_err)?;
    Ok(RegisteredClient {
        id: id.parse().map_err(|e| JotteryError::InternalError(format!("corrupt client id: {e}")))?,
        api_key_hash: row.try_get("api_key_hash").map_err(db_err)?,
        device_name: row.try_get("device_name").map_err(db_err)?,
        device_type: row.try_get("device_type").map_err(db_err)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(db_err)?,
        last_seen_at: row.try_get::<DateTime<Utc>, _>("last_seen_at").map_err(db_err)?,
        active: row.try_get::<i64, _>("active").map_err(db_err)? != 0,
    })
}

#[async_trait]
impl RegisteredClientRepository for SqliteRegisteredClientRepository {
    async fn insert(&self, client: &RegisteredClient) -> Result<(), JotteryError> {
        sqlx::query(
            "INSERT INTO clients (id, api_key_hash, device_name, device_type, created_at, last_seen_at, active) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(client.id.to_string())
        .bind(&client.api_key_hash)
        .bind(&client.device_name)
        .bind(&client.device_type)
        .bind(client.created_at)
        .bind(client.last_seen_at)
        .bind(client.active)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_by_id(&self, id: ClientId) -> Result<Option<RegisteredClient>, JotteryError> {
        let row = sqlx::query("SELECT * FROM clients WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_client).transpose()
    }

    async fn get_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<RegisteredClient>, JotteryError> {
        let row = sqlx::query("SELECT * FROM clients WHERE api_key_hash = ?")
            .bind(api_key_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_client).transpose()
    }

    async fn touch_last_seen(&self, id: ClientId) -> Result<(), JotteryError> {
        sqlx::query("UPDATE clients SET last_seen_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn deactivate(&self, id: ClientId) -> Result<(), JotteryError> {
        sqlx::query("UPDATE clients SET active = 0 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_server_database;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn insert_then_lookup_by_api_key_hash() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        let repo = SqliteRegisteredClientRepository::new(pool);

        let now = Utc::now();
        let client = RegisteredClient {
            id: ClientId::new(),
            api_key_hash: "abc123".to_string(),
            device_name: "laptop".to_string(),
            device_type: "cli".to_string(),
            created_at: now,
            last_seen_at: now,
            active: true,
        };
        repo.insert(&client).await.unwrap();

        let fetched = repo.get_by_api_key_hash("abc123").await.unwrap().unwrap();
        assert_eq!(fetched.id, client.id);
        assert!(fetched.active);
    }

    #[tokio::test]
    async fn deactivate_clears_the_active_flag() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        let repo = SqliteRegisteredClientRepository::new(pool);

        let now = Utc::now();
        let client = RegisteredClient {
            id: ClientId::new(),
            api_key_hash: "xyz".to_string(),
            device_name: "phone".to_string(),
            device_type: "web".to_string(),
            created_at: now,
            last_seen_at: now,
            active: true,
        };
        repo.insert(&client).await.unwrap();
        repo.deactivate(client.id).await.unwrap();

        let fetched = repo.get_by_id(client.id).await.unwrap().unwrap();
        assert!(!fetched.active);
    }
}
