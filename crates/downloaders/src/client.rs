//! Polymorphic download-client contract (§4.7.1)
//!
//! One driver per protocol dialect implements `DownloadClient` and,
//! where applicable, the `TorrentClient`/`UsenetClient` capability
//! mixins. The downloader service only ever talks to these trait
//! objects, never to a concrete driver type, mirroring the teacher's
//! single-protocol `QBittorrentClient` but generalized to many.

use async_trait::async_trait;
use radarr_core::models::{DownloadClientRecord, DownloadItem};
use radarr_core::{RadarrError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Transmission,
    QBittorrent,
    Deluge,
    Vuze,
    RTorrent,
    Aria2,
    Flood,
    UTorrent,
    Hadouken,
    DownloadStation,
    FreeboxDownload,
    Rqbit,
    Tribler,
    Sabnzbd,
    Mock,
    Nzbget,
}

impl ClientType {
    pub fn from_str_tag(tag: &str) -> Result<Self> {
        Ok(match tag.to_lowercase().as_str() {
            "transmission" => ClientType::Transmission,
            "qbittorrent" => ClientType::QBittorrent,
            "deluge" => ClientType::Deluge,
            "vuze" => ClientType::Vuze,
            "rtorrent" => ClientType::RTorrent,
            "aria2" => ClientType::Aria2,
            "flood" => ClientType::Flood,
            "utorrent" => ClientType::UTorrent,
            "hadouken" => ClientType::Hadouken,
            "downloadstation" => ClientType::DownloadStation,
            "freeboxdownload" => ClientType::FreeboxDownload,
            "rqbit" => ClientType::Rqbit,
            "tribler" => ClientType::Tribler,
            "sabnzbd" => ClientType::Sabnzbd,
            "mock" => ClientType::Mock,
            "nzbget" => ClientType::Nzbget,
            other => {
                return Err(RadarrError::UnsupportedClient {
                    client_type: other.to_string(),
                })
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Torrent,
    Usenet,
}

/// Options for `Add`/`AddWithContent` (§4.7.5).
pub struct AddOptions<'a> {
    pub url: Option<&'a str>,
    pub magnet: Option<&'a str>,
    pub content: Option<&'a [u8]>,
    pub category: Option<&'a str>,
    pub download_dir: &'a str,
    pub paused: bool,
}

/// Capability set every driver implements (§4.7.1).
#[async_trait]
pub trait DownloadClient: Send + Sync {
    fn client_type(&self) -> ClientType;
    fn protocol(&self) -> Protocol;

    async fn test(&self) -> Result<()>;
    async fn connect(&self) -> Result<()>;
    async fn add(&self, opts: &AddOptions<'_>) -> Result<String>;
    async fn list(&self) -> Result<Vec<DownloadItem>>;
    async fn get(&self, id: &str) -> Result<DownloadItem>;
    async fn remove(&self, id: &str, delete_files: bool) -> Result<()>;
    async fn pause(&self, id: &str) -> Result<()>;
    async fn resume(&self, id: &str) -> Result<()>;
    async fn get_download_dir(&self) -> Result<String>;

    /// Default subdirectory join behavior (§4.7.5 step 2), shared across
    /// drivers; a driver may override if its wire API wants a different
    /// path convention.
    fn resolve_download_path(&self, base_dir: &str, subdir: &str) -> String {
        format!("{}/{}", base_dir.trim_end_matches('/'), subdir.trim_matches('/'))
    }
}

#[async_trait]
pub trait TorrentClient: DownloadClient {
    async fn add_magnet(&self, magnet: &str, download_dir: &str) -> Result<String>;
    async fn set_seed_limits(&self, id: &str, ratio: Option<f64>) -> Result<()>;
    async fn get_torrent_info(&self, id: &str) -> Result<DownloadItem>;
}

#[async_trait]
pub trait UsenetClient: DownloadClient {
    async fn get_queue(&self) -> Result<Vec<DownloadItem>>;
    async fn get_history(&self) -> Result<Vec<DownloadItem>>;
}

/// Subdirectory naming per §4.7.5 step 2.
pub fn target_subdirectory(is_tv: bool) -> &'static str {
    if is_tv {
        "SlipStream/Series"
    } else {
        "SlipStream/Movies"
    }
}

/// Builds a `DownloadClientRecord`-derived config key used for pool
/// caching/logging; kept tiny and free of any driver-specific fields.
pub fn describe(record: &DownloadClientRecord) -> String {
    format!("{}#{} ({})", record.name, record.id, record.client_type)
}
