// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Write-only audit log for the server's `sync_operations` table.
//!
//! Diagnostic only, per spec §6 ("Persisted state") — nothing in the
//! server core reads this table back; it exists so an operator can answer
//! "what did client X's last push look like" without decrypting content.
//! Not a domain repository trait: the rest of the sync protocol has no
//! notion of this table, so the seam lives here rather than in
//! `jottery-domain::repositories`.

use async_trait::async_trait;
use chrono::Utc;
use jottery_domain::error::JotteryError;
use jottery_domain::value_objects::{ClientId, NoteId};
use sqlx::SqlitePool;

#[async_trait]
pub trait SyncOperationsAudit: Send + Sync {
    async fn record(
        &self,
        client_id: ClientId,
        operation: &str,
        note_id: Option<NoteId>,
        outcome: &str,
        detail: Option<&str>,
    ) -> Result<(), JotteryError>;
}

pub struct SqliteSyncOperationsAudit {
    pool: SqlitePool,
}

impl SqliteSyncOperationsAudit {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncOperationsAudit for SqliteSyncOperationsAudit {
    async fn record(
        &self,
        client_id: ClientId,
        operation: &str,
        note_id: Option<NoteId>,
        outcome: &str,
        detail: Option<&str>,
    ) -> Result<(), JotteryError> {
        sqlx::query(
            "INSERT INTO sync_operations (client_id, operation, note_id, outcome, detail, occurred_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(client_id.to_string())
        .bind(operation)
        .bind(note_id.map(|id| id.to_string()))
        .bind(outcome)
        .bind(detail)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| JotteryError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repositories::schema::initialize_server_database;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn records_an_operation_row_without_error() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        let pool = initialize_server_database(&db_url).await.unwrap();
        let audit = SqliteSyncOperationsAudit::new(pool.clone());

        let client_id = ClientId::new();
        audit.record(client_id, "push", Some(NoteId::new()), "accepted", None).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_operations WHERE client_id = ?")
            .bind(client_id.to_string())
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }
}
