//! Domain repositories
//!
//! This module defines the repository traits that provide abstraction
//! over data persistence for domain entities.

use crate::models::*;
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// The repository contract the acquisition pipeline is built against
/// (§6). Opaque with respect to schema/SQL — any SQL-capable backend can
/// implement it. Split by responsibility for readability, but one
/// implementor (`crates/infrastructure`) is expected to satisfy all of
/// them against the same connection pool.

/// Wanted-item collection queries (§4.1).
#[async_trait]
pub trait WantedRepository: Send + Sync {
    async fn list_missing_movies(&self) -> Result<Vec<SearchableItem>>;
    async fn list_movie_upgrade_candidates(&self) -> Result<Vec<SearchableItem>>;
    /// Raw episode rows for missing/upgrade grouping; the collector
    /// itself does the per-`(series_id, season_number)` grouping.
    async fn list_missing_episodes(&self) -> Result<Vec<EpisodeRow>>;
    async fn list_episode_upgrade_candidates(&self) -> Result<Vec<EpisodeRow>>;
    async fn get_season_by_number(&self, series_id: Uuid, season_number: i32) -> Result<Option<SeasonRow>>;
    async fn list_episodes_by_season(&self, series_id: Uuid, season_number: i32) -> Result<Vec<EpisodeRow>>;
}

/// A raw episode projection used by the collector/matcher to group by
/// `(series_id, season_number)` before any season-pack collapsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRow {
    pub episode_id: Uuid,
    pub series_id: Uuid,
    pub season_number: i32,
    pub episode_number: i32,
    pub title: String,
    pub year: Option<i32>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i32>,
    pub tvdb_id: Option<i32>,
    pub quality_profile_id: Uuid,
    pub monitored: bool,
    pub status: MediaStatus,
    pub has_file: bool,
    pub current_quality_id: Option<i32>,
    pub target_slot_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonRow {
    pub series_id: Uuid,
    pub season_number: i32,
    pub monitored: bool,
}

use serde::{Deserialize, Serialize};

/// Download-client configuration + mapping + queue-media persistence.
#[async_trait]
pub trait DownloadClientRepository: Send + Sync {
    async fn list_enabled_download_clients(&self) -> Result<Vec<DownloadClientRecord>>;
    async fn list_active_download_mappings(&self) -> Result<Vec<DownloadMapping>>;
    async fn list_downloading_movies(&self) -> Result<Vec<MediaItem>>;
    async fn list_downloading_episodes(&self) -> Result<Vec<MediaItem>>;

    async fn create_download_mapping(&self, mapping: &DownloadMapping) -> Result<DownloadMapping>;
    async fn get_download_mapping(&self, client_id: i32, download_id: &str) -> Result<Option<DownloadMapping>>;
    async fn delete_download_mapping(&self, id: Uuid) -> Result<()>;
    /// Clears `target_slot_id` without deleting the mapping row itself;
    /// used by `HandleFailedDownload` before the mapping is deleted.
    async fn clear_download_mapping_slot(&self, id: Uuid) -> Result<()>;

    async fn update_movie_status_with_details(
        &self,
        movie_id: Uuid,
        status: MediaStatus,
        active_download_id: Option<String>,
        status_message: Option<String>,
    ) -> Result<()>;
    async fn update_episode_status_with_details(
        &self,
        episode_id: Uuid,
        status: MediaStatus,
        active_download_id: Option<String>,
        status_message: Option<String>,
    ) -> Result<()>;

    async fn create_queue_media(&self, media: &QueueMedia) -> Result<QueueMedia>;
    async fn update_queue_media(&self, media: &QueueMedia) -> Result<QueueMedia>;
    async fn delete_queue_media(&self, id: Uuid) -> Result<()>;
    async fn list_queue_media_by_mapping(&self, mapping_id: Uuid) -> Result<Vec<QueueMedia>>;
}

/// Indexer RSS enablement + per-indexer cache boundary persistence.
#[async_trait]
pub trait IndexerRssRepository: Send + Sync {
    async fn list_rss_enabled_indexers(&self) -> Result<Vec<Indexer>>;
    async fn get_indexer_rss_cache(&self, indexer_id: i32) -> Result<CacheBoundary>;
    async fn update_indexer_rss_cache(&self, indexer_id: i32, boundary: &CacheBoundary) -> Result<()>;
}

/// Generic settings KV (§6: `rsssync_settings`, `prowlarr_rss_cache_boundary`).
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>>;
    async fn set_setting(&self, key: &str, value: &str) -> Result<()>;
}

/// Multi-version "slot" enumeration and recent-grab history, the durable
/// dedup fabric per §9 ("History as the dedup fabric").
#[async_trait]
pub trait GrabHistoryRepository: Send + Sync {
    async fn list_version_slots(&self, media_type: MediaType, media_id: Uuid) -> Result<Vec<i32>>;
    async fn has_recent_grab(&self, media_type: MediaType, media_id: Uuid) -> Result<bool>;
    async fn has_recent_season_grab(&self, series_id: Uuid, season_number: i32) -> Result<bool>;
    async fn record_grab_history(
        &self,
        media_type: MediaType,
        media_id: Uuid,
        quality_name: &str,
        is_upgrade: bool,
        client_name: &str,
        download_id: &str,
        target_slot_id: Option<i32>,
    ) -> Result<()>;
}

