//! PostgreSQL implementation of `IndexerRssRepository` (§4.2, §8).
//!
//! Reuses `indexer.rs`'s row-to-`Indexer` mapping for the enabled-list
//! query. Per-indexer cache boundaries live in a dedicated
//! `indexer_rss_cache` table; the synthetic Prowlarr-aggregated feed
//! (`indexer_id == 0`) is persisted through the generic settings KV
//! under `prowlarr_rss_cache_boundary`, per the model doc comment on
//! `CacheBoundary`.

use async_trait::async_trait;
use radarr_core::domain::repositories::{IndexerRssRepository, SettingsRepository};
use radarr_core::models::{CacheBoundary, Indexer};
use radarr_core::Result;
use sqlx::Row;

use crate::repositories::indexer::parse_indexer_implementation;
use crate::repositories::settings::PostgresSettingsRepository;
use crate::repositories::wanted::PostgresAcquisitionRepository;

const PROWLARR_SYNTHETIC_INDEXER_ID: i32 = 0;
const PROWLARR_CACHE_SETTING_KEY: &str = "prowlarr_rss_cache_boundary";

impl PostgresAcquisitionRepository {
    fn settings(&self) -> PostgresSettingsRepository {
        PostgresSettingsRepository::new(self.pool.clone())
    }
}

#[async_trait]
impl IndexerRssRepository for PostgresAcquisitionRepository {
    async fn list_rss_enabled_indexers(&self) -> Result<Vec<Indexer>> {
        let rows = sqlx::query(
            "SELECT id, name, implementation, settings, enabled, priority,
             enable_rss, enable_automatic_search, enable_interactive_search,
             download_client_id, created_at, updated_at
             FROM indexers WHERE enabled = true AND enable_rss = true
             ORDER BY priority ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Indexer {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    implementation: parse_indexer_implementation(&row.try_get::<String, _>("implementation")?)?,
                    settings: row.try_get("settings")?,
                    enabled: row.try_get("enabled")?,
                    priority: row.try_get("priority")?,
                    enable_rss: row.try_get("enable_rss")?,
                    enable_automatic_search: row.try_get("enable_automatic_search")?,
                    enable_interactive_search: row.try_get("enable_interactive_search")?,
                    download_client_id: row.try_get("download_client_id")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    async fn get_indexer_rss_cache(&self, indexer_id: i32) -> Result<CacheBoundary> {
        if indexer_id == PROWLARR_SYNTHETIC_INDEXER_ID {
            return Ok(self
                .settings()
                .get_setting(PROWLARR_CACHE_SETTING_KEY)
                .await?
                .and_then(|raw| serde_json::from_str(&raw).ok())
                .unwrap_or_default());
        }

        let row = sqlx::query("SELECT url, publish_date FROM indexer_rss_cache WHERE indexer_id = $1")
            .bind(indexer_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(CacheBoundary { url: row.try_get("url")?, publish_date: row.try_get("publish_date")? }),
            None => Ok(CacheBoundary::default()),
        }
    }

    async fn update_indexer_rss_cache(&self, indexer_id: i32, boundary: &CacheBoundary) -> Result<()> {
        if indexer_id == PROWLARR_SYNTHETIC_INDEXER_ID {
            let raw = serde_json::to_string(boundary).map_err(|e| radarr_core::RadarrError::DatabaseError { message: e.to_string() })?;
            return self.settings().set_setting(PROWLARR_CACHE_SETTING_KEY, &raw).await;
        }

        sqlx::query(
            "INSERT INTO indexer_rss_cache (indexer_id, url, publish_date)
             VALUES ($1, $2, $3)
             ON CONFLICT (indexer_id) DO UPDATE SET url = $2, publish_date = $3",
        )
        .bind(indexer_id)
        .bind(&boundary.url)
        .bind(boundary.publish_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
