// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`SyncMetadataRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jottery_domain::entities::{NoteSyncMetadata, SyncMetadataGlobal};
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::SyncMetadataRepository;
use jottery_domain::value_objects::{ApiKey, NoteId, SyncStatus};
use sqlx::{Row, SqlitePool};

pub struct SqliteSyncMetadataRepository {
    pool: SqlitePool,
}

impl SqliteSyncMetadataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> JotteryError {
    JotteryError::StorageUnavailable(e.to_string())
}

fn status_to_str(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Synced => "synced",
        SyncStatus::Pending => "pending",
        SyncStatus::Conflict => "conflict",
        SyncStatus::Error => "error",
    }
}

fn status_from_str(raw: &str) -> SyncStatus {
    match raw {
        "synced" => SyncStatus::Synced,
        "conflict" => SyncStatus::Conflict,
        "error" => SyncStatus::Error,
        _ => SyncStatus::Pending,
    }
}

#[async_trait]
impl SyncMetadataRepository for SqliteSyncMetadataRepository {
    async fn get_global(&self) -> Result<SyncMetadataGlobal, JotteryError> {
        let row = sqlx::query("SELECT * FROM sync_metadata_global WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        let Some(row) = row else { return Ok(SyncMetadataGlobal::default()) };

        Ok(SyncMetadataGlobal {
            last_sync_at: row.try_get::<Option<DateTime<Utc>>, _>("last_sync_at").map_err(db_err)?,
            last_push_attempt_at: row
                .try_get::<Option<DateTime<Utc>>, _>("last_push_attempt_at")
                .map_err(db_err)?,
            last_pull_attempt_at: row
                .try_get::<Option<DateTime<Utc>>, _>("last_pull_attempt_at")
                .map_err(db_err)?,
            api_key: ApiKey::from_storage_repr(&row.try_get::<String, _>("api_key").map_err(db_err)?),
            client_id: row.try_get("client_id").map_err(db_err)?,
            sync_enabled: row.try_get::<i64, _>("sync_enabled").map_err(db_err)? != 0,
            sync_endpoint: row.try_get("sync_endpoint").map_err(db_err)?,
            auto_sync_interval_minutes: row.try_get::<i64, _>("auto_sync_interval_minutes").map_err(db_err)? as u32,
        })
    }

    async fn put_global(&self, metadata: &SyncMetadataGlobal) -> Result<(), JotteryError> {
        sqlx::query(
            r#"
            INSERT INTO sync_metadata_global (
                id, last_sync_at, last_push_attempt_at, last_pull_attempt_at,
                api_key, client_id, sync_enabled, sync_endpoint, auto_sync_interval_minutes
            ) VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                last_sync_at = excluded.last_sync_at,
                last_push_attempt_at = excluded.last_push_attempt_at,
                last_pull_attempt_at = excluded.last_pull_attempt_at,
                api_key = excluded.api_key,
                client_id = excluded.client_id,
                sync_enabled = excluded.sync_enabled,
                sync_endpoint = excluded.sync_endpoint,
                auto_sync_interval_minutes = excluded.auto_sync_interval_minutes
            "#,
        )
        .bind(metadata.last_sync_at)
        .bind(metadata.last_push_attempt_at)
        .bind(metadata.last_pull_attempt_at)
        .bind(metadata.api_key.to_storage_repr())
        .bind(&metadata.client_id)
        .bind(metadata.sync_enabled)
        .bind(&metadata.sync_endpoint)
        .bind(metadata.auto_sync_interval_minutes as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_note(&self, note_id: NoteId) -> Result<Option<NoteSyncMetadata>, JotteryError> {
        let row = sqlx::query("SELECT * FROM sync_metadata_note WHERE note_id = ?")
            .bind(note_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some(row_to_note_sync_metadata(&row)?))
    }

    async fn put_note(&self, metadata: &NoteSyncMetadata) -> Result<(), JotteryError> {
        sqlx::query(
            r#"
            INSERT INTO sync_metadata_note (
                note_id, last_synced_at, content_hash_at_sync, server_version_at_sync, status, error_message
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (note_id) DO UPDATE SET
                last_synced_at = excluded.last_synced_at,
                content_hash_at_sync = excluded.content_hash_at_sync,
                server_version_at_sync = excluded.server_version_at_sync,
                status = excluded.status,
                error_message = excluded.error_message
            "#,
        )
        .bind(metadata.note_id.to_string())
        .bind(metadata.last_synced_at)
        .bind(metadata.content_hash_at_sync.map(|h| h.to_vec()))
        .bind(metadata.server_version_at_sync.map(|v| v as i64))
        .bind(status_to_str(metadata.status))
        .bind(&metadata.error_message)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<NoteSyncMetadata>, JotteryError> {
        let rows = sqlx::query("SELECT * FROM sync_metadata_note WHERE status != 'synced'")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_note_sync_metadata).collect()
    }

    async fn count_conflicts(&self) -> Result<u64, JotteryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_metadata_note WHERE status = 'conflict'")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count as u64)
    }

    async fn delete_note(&self, note_id: NoteId) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM sync_metadata_note WHERE note_id = ?")
            .bind(note_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM sync_metadata_note").execute(&self.pool).await.map_err(db_err)?;
        Ok(())
    }
}

fn row_to_note_sync_metadata(row: &sqlx::sqlite::SqliteRow) -> Result<NoteSyncMetadata, JotteryError> {
    let note_id: String = row.try_get("note_id").map_err(db_err)?;
    let content_hash: Option<Vec<u8>> = row.try_get("content_hash_at_sync").map_err(db_err)?;
    let status: String = row.try_get("status").map_err(db_err)?;

    Ok(NoteSyncMetadata {
        note_id: note_id.parse().map_err(|e| JotteryError::InternalError(format!("corrupt note id: {e}")))?,
        last_synced_at: row.try_get::<Option<DateTime<Utc>>, _>("last_synced_at").map_err(db_err)?,
        content_hash_at_sync: content_hash.map(|bytes| {
            let mut out = [0u8; 32];
            let len = bytes.len().min(32);
            out[..len].copy_from_slice(&bytes[..len]);
            out
        }),
        server_version_at_sync: row
            .try_get::<Option<i64>, _>("server_version_at_sync")
            .map_err(db_err)?
            .map(|v| v as u64),
        status: status_from_str(&status),
        error_message: row.try_get("error_message").map_err(db_err)?,
    })
}
