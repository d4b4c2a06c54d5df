//! PostgreSQL implementation of `SettingsRepository`: a generic KV table
//! backing `rsssync_settings` and the Prowlarr RSS cache boundary (§6).
//!
//! Grounded in `repositories/download.rs`'s raw-query idiom; the table
//! itself is a plain `(key primary key, value)` pair with no domain
//! model of its own, so there's no row-to-struct mapping to speak of.

use async_trait::async_trait;
use radarr_core::domain::repositories::SettingsRepository;
use radarr_core::Result;
use sqlx::Row;

use crate::database::DatabasePool;

pub struct PostgresSettingsRepository {
    pool: DatabasePool,
}

impl PostgresSettingsRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = $1").bind(key).fetch_optional(&self.pool).await?;
        row.map(|r| r.try_get("value")).transpose().map_err(Into::into)
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = $2",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
