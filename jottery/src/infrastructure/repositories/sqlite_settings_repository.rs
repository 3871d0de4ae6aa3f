// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed [`SettingsRepository`].

use async_trait::async_trait;
use jottery_domain::entities::{Settings, SettingsPatch};
use jottery_domain::error::JotteryError;
use jottery_domain::repositories::SettingsRepository;
use jottery_domain::value_objects::SortOrder;
use sqlx::{Row, SqlitePool};

pub struct SqliteSettingsRepository {
    pool: SqlitePool,
}

impl SqliteSettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> JotteryError {
    JotteryError::StorageUnavailable(e.to_string())
}

fn sort_order_to_str(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Recent => "recent",
        SortOrder::Oldest => "oldest",
        SortOrder::Created => "created",
        SortOrder::Alpha => "alpha",
    }
}

fn sort_order_from_str(value: &str) -> SortOrder {
    match value {
        "oldest" => SortOrder::Oldest,
        "created" => SortOrder::Created,
        "alpha" => SortOrder::Alpha,
        _ => SortOrder::Recent,
    }
}

fn row_to_settings(row: &sqlx::sqlite::SqliteRow) -> Result<Settings, JotteryError> {
    Ok(Settings {
        word_wrap_default: row.try_get::<i64, _>("word_wrap_default").map_err(db_err)? != 0,
        auto_lock_minutes: row.try_get::<i64, _>("auto_lock_minutes").map_err(db_err)? as u32,
        default_sort: sort_order_from_str(&row.try_get::<String, _>("default_sort").map_err(db_err)?),
    })
}

#[async_trait]
impl SettingsRepository for SqliteSettingsRepository {
    async fn get(&self) -> Result<Settings, JotteryError> {
        let row = sqlx::query("SELECT * FROM settings WHERE id = 1").fetch_optional(&self.pool).await.map_err(db_err)?;
        match row {
            Some(row) => row_to_settings(&row),
            None => Ok(Settings::default()),
        }
    }

    async fn update(&self, patch: &SettingsPatch) -> Result<Settings, JotteryError> {
        let current = self.get().await?;
        let merged = current.merge(patch);

        sqlx::query(
            r#"
            INSERT INTO settings (id, word_wrap_default, auto_lock_minutes, default_sort)
            VALUES (1, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                word_wrap_default = excluded.word_wrap_default,
                auto_lock_minutes = excluded.auto_lock_minutes,
                default_sort = excluded.default_sort
            "#,
        )
        .bind(merged.word_wrap_default)
        .bind(merged.auto_lock_minutes as i64)
        .bind(sort_order_to_str(merged.default_sort))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(merged)
    }

    async fn reset(&self) -> Result<(), JotteryError> {
        sqlx::query("DELETE FROM settings WHERE id = 1").execute(&self.pool).await.map_err(db_err)?;
        Ok(())
    }

    async fn exists(&self) -> Result<bool, JotteryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE id = 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }
}
