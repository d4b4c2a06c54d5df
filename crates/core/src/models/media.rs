//! Media catalog model for the acquisition pipeline
//!
//! Unlike `models::movie`, which is the teacher's movie-only catalog row,
//! `MediaItem`/`SearchableItem` generalize across movies, seasons,
//! episodes and series so the wanted collector, matcher and selector can
//! operate on one shape regardless of media type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminant for `MediaItem`/`SearchableItem`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Season,
    Episode,
    Series,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Season => write!(f, "season"),
            MediaType::Episode => write!(f, "episode"),
            MediaType::Series => write!(f, "series"),
        }
    }
}

/// Catalog status of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaStatus {
    Missing,
    Unreleased,
    Available,
    Upgradable,
    Downloading,
    Failed,
}

impl std::fmt::Display for MediaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaStatus::Missing => write!(f, "missing"),
            MediaStatus::Unreleased => write!(f, "unreleased"),
            MediaStatus::Available => write!(f, "available"),
            MediaStatus::Upgradable => write!(f, "upgradable"),
            MediaStatus::Downloading => write!(f, "downloading"),
            MediaStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A catalog row the acquisition pipeline can act on.
///
/// `(media_type, media_id)` is the identity pair used throughout the
/// pipeline (grab lock keys, history lookups, disappearance detection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub media_type: MediaType,
    pub media_id: Uuid,

    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i32>,
    pub tvdb_id: Option<i32>,

    pub quality_profile_id: Uuid,
    pub monitored: bool,
    pub status: MediaStatus,

    /// Quality of the best file currently on disk for this item, if any.
    pub current_quality_id: Option<i32>,
    pub active_download_id: Option<String>,
    pub status_message: Option<String>,
    /// Opaque multi-version "slot" target; cleared on grab failure.
    pub target_slot_id: Option<i32>,

    // Series/season context; populated for Season and Episode variants.
    pub series_id: Option<Uuid>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
}

/// Projection of a wanted `MediaItem` carrying everything the matcher and
/// selector need, without further repository access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchableItem {
    pub media_type: MediaType,
    pub media_id: Uuid,

    pub title: String,
    pub year: Option<i32>,

    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i32>,
    pub tvdb_id: Option<i32>,

    pub series_id: Option<Uuid>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,

    pub quality_profile_id: Uuid,

    /// Invariant: `has_file ⇒ current_quality_id` is the MAX across file
    /// records for this item (or, for a season, the MAX across that
    /// season's episode files).
    pub has_file: bool,
    pub current_quality_id: Option<i32>,

    pub target_slot_id: Option<i32>,
}

impl SearchableItem {
    pub fn item_key(&self) -> String {
        match self.media_type {
            MediaType::Movie => format!("movie:{}", self.media_id),
            MediaType::Episode => format!("episode:{}", self.media_id),
            MediaType::Season => format!(
                "season:{}:{}",
                self.series_id.unwrap_or_default(),
                self.season_number.unwrap_or_default()
            ),
            MediaType::Series => format!("series:{}", self.media_id),
        }
    }

    pub fn grab_lock_key(&self) -> String {
        format!("{}:{}", self.media_type, self.media_id)
    }
}

/// A release candidate, as returned by an indexer search.
///
/// Named `ReleaseInfo`/`TorrentInfo` interchangeably in the spec; kept as
/// one struct since every field the torrent-specific path needs
/// (`info_hash`, `seeders`, `leechers`) is also meaningful for usenet
/// results (absent there).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub title: String,
    pub download_url: String,
    pub guid: String,
    /// Release/details page URL; scraped for a `ttNNNNNN` IMDb id when the
    /// indexer doesn't surface one directly (§4.3 step 2).
    pub info_url: Option<String>,
    pub indexer_id: i32,
    pub indexer_name: String,
    pub publish_date: chrono::DateTime<chrono::Utc>,

    pub source: Option<String>,
    pub resolution: Option<String>,

    pub imdb_id: Option<String>,
    pub tmdb_id: Option<i32>,
    pub tvdb_id: Option<i32>,

    pub info_hash: Option<String>,
    pub seeders: Option<i32>,
    pub leechers: Option<i32>,
    pub size_bytes: Option<i64>,

    pub score: i32,
    pub score_breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub quality_id: i32,
    pub quality_name: String,
    pub components: std::collections::BTreeMap<String, i32>,
}

/// Cleanup policy applied once a download finishes (or reaches a seed target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupMode {
    Leave,
    DeleteAfterImport,
    DeleteAfterSeedRatio,
}

/// A configured download client row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadClientRecord {
    pub id: i32,
    pub name: String,
    pub client_type: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub url_base: Option<String>,
    pub use_ssl: bool,
    pub category: Option<String>,
    pub priority: i32,
    pub enabled: bool,
    pub import_delay_seconds: u32,
    pub cleanup_mode: CleanupMode,
    pub seed_ratio_target: Option<f64>,
}

impl DownloadClientRecord {
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        let base = self.url_base.as_deref().unwrap_or("");
        format!("{scheme}://{}:{}{}", self.host, self.port, base)
    }
}

/// Neutral download status every driver's wire status is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadItemStatus {
    Queued,
    Downloading,
    Paused,
    Completed,
    Seeding,
    Warning,
    Error,
    Unknown,
}

/// A single download as reported live by a client driver's `List`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: String,
    pub name: String,
    pub status: DownloadItemStatus,
    /// 0..100
    pub progress: f64,
    pub size_bytes: Option<i64>,
    pub downloaded_bytes: Option<i64>,
    pub download_speed: Option<u64>,
    pub upload_speed: Option<u64>,
    /// -1 = unknown
    pub eta_seconds: i64,
    pub download_dir: Option<String>,
    pub added_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error: Option<String>,
}

impl DownloadItem {
    pub fn is_complete(&self) -> bool {
        matches!(
            self.status,
            DownloadItemStatus::Completed | DownloadItemStatus::Seeding
        ) || (self.status == DownloadItemStatus::Paused && self.progress >= 100.0)
    }
}

/// Links a live client download back to the wanted catalog row that
/// triggered the grab. Lookup key is `(client_id, download_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadMapping {
    pub id: Uuid,
    pub client_id: i32,
    pub download_id: String,
    pub movie_id: Option<Uuid>,
    pub series_id: Option<Uuid>,
    pub season_number: Option<i32>,
    pub episode_id: Option<Uuid>,
    pub is_season_pack: bool,
    pub is_complete_series: bool,
    pub target_slot_id: Option<i32>,
}

/// Per-file state within a (possibly multi-file) download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueFileStatus {
    Pending,
    Downloading,
    Ready,
    Importing,
    Imported,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMedia {
    pub id: Uuid,
    pub download_mapping_id: Uuid,
    pub movie_id: Option<Uuid>,
    pub episode_id: Option<Uuid>,
    pub file_path: Option<String>,
    pub file_status: QueueFileStatus,
    pub error_message: Option<String>,
    pub import_attempts: i32,
    pub target_slot_id: Option<i32>,
}

/// Per-indexer RSS cache boundary. Special `indexer_id == 0` denotes the
/// Prowlarr-aggregated synthetic feed, persisted via settings KV under
/// `prowlarr_rss_cache_boundary` rather than `indexer_status` rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheBoundary {
    pub url: Option<String>,
    pub publish_date: Option<chrono::DateTime<chrono::Utc>>,
}

impl CacheBoundary {
    /// Symmetric-in-url per §8: differing urls never match regardless of
    /// date; matching urls with no recorded date always match; otherwise
    /// match iff the candidate is not newer than the boundary date.
    pub fn is_boundary(&self, download_url: &str, publish_date: chrono::DateTime<chrono::Utc>) -> bool {
        match &self.url {
            Some(u) if u == download_url => match self.publish_date {
                None => true,
                Some(boundary_date) => publish_date <= boundary_date,
            },
            _ => false,
        }
    }
}
