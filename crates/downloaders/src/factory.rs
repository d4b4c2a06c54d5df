//! Maps a configured `DownloadClientRecord` to a constructed driver behind
//! the `DownloadClient` trait object, so the downloader service (§4.7)
//! never matches on `ClientType` itself once a client is built.

use std::sync::Arc;

use radarr_core::models::DownloadClientRecord;
use radarr_core::{RadarrError, Result};

use crate::client::{ClientType, DownloadClient};
use crate::deluge::{DelugeClient, DelugeConfig};
use crate::mock::MockClient;
use crate::nzbget::NzbgetClient;
use crate::qbittorrent::{QBittorrentClient, QBittorrentConfig};
use crate::sabnzbd::{SabnzbdClient, SabnzbdConfig};
use crate::thin::{Aria2Client, RTorrentClient, UTorrentClient};
use crate::thin2::{DownloadStationClient, FloodClient, FreeboxDownloadClient, HadoukenClient, RqbitClient, TriblerClient};
use crate::transmission::{TransmissionClient, TransmissionConfig};

const DEFAULT_TIMEOUT: u64 = 30;

/// Build the driver for a configured client row. Credentials live on the
/// record itself (host/port/username/password/api_key); a missing
/// credential required by the chosen driver is a configuration error, not
/// a panic.
pub fn build_client(record: &DownloadClientRecord) -> Result<Arc<dyn DownloadClient>> {
    let client_type = ClientType::from_str_tag(&record.client_type)?;
    let base_url = record.base_url();

    let require = |field: &Option<String>, name: &str| -> Result<String> {
        field.clone().ok_or_else(|| RadarrError::InvalidClient {
            client: record.client_type.clone(),
            message: format!("missing required field: {name}"),
        })
    };

    Ok(match client_type {
        ClientType::QBittorrent => Arc::new(QBittorrentClient::new(QBittorrentConfig {
            base_url,
            username: record.username.clone().unwrap_or_default(),
            password: record.password.clone().unwrap_or_default(),
            timeout: DEFAULT_TIMEOUT,
        })?),
        ClientType::Transmission => Arc::new(TransmissionClient::new(TransmissionConfig {
            base_url,
            username: record.username.clone(),
            password: record.password.clone(),
            timeout: DEFAULT_TIMEOUT,
            is_vuze: false,
        })?),
        ClientType::Vuze => Arc::new(TransmissionClient::new(TransmissionConfig {
            base_url,
            username: record.username.clone(),
            password: record.password.clone(),
            timeout: DEFAULT_TIMEOUT,
            is_vuze: true,
        })?),
        ClientType::Deluge => Arc::new(DelugeClient::new(DelugeConfig {
            base_url,
            password: require(&record.password, "password")?,
            timeout: DEFAULT_TIMEOUT,
        })?),
        ClientType::Sabnzbd => Arc::new(SabnzbdClient::new(SabnzbdConfig {
            base_url,
            api_key: require(&record.api_key, "api_key")?,
            category: record.category.clone(),
            timeout: DEFAULT_TIMEOUT,
        })?),
        ClientType::RTorrent => Arc::new(RTorrentClient::new(base_url, DEFAULT_TIMEOUT)?),
        ClientType::Aria2 => Arc::new(Aria2Client::new(base_url, record.api_key.clone(), DEFAULT_TIMEOUT)?),
        ClientType::UTorrent => Arc::new(UTorrentClient::new(
            base_url,
            record.username.clone().unwrap_or_default(),
            record.password.clone().unwrap_or_default(),
            DEFAULT_TIMEOUT,
        )?),
        ClientType::Flood => Arc::new(FloodClient::new(
            base_url,
            record.username.clone().unwrap_or_default(),
            record.password.clone().unwrap_or_default(),
            DEFAULT_TIMEOUT,
        )?),
        ClientType::Hadouken => Arc::new(HadoukenClient::new(base_url, DEFAULT_TIMEOUT)?),
        ClientType::DownloadStation => Arc::new(DownloadStationClient::new(
            base_url,
            require(&record.username, "username")?,
            require(&record.password, "password")?,
            DEFAULT_TIMEOUT,
        )?),
        ClientType::FreeboxDownload => Arc::new(FreeboxDownloadClient::new(
            base_url,
            require(&record.api_key, "api_key (app token)")?,
            DEFAULT_TIMEOUT,
        )?),
        ClientType::Rqbit => Arc::new(RqbitClient::new(base_url, DEFAULT_TIMEOUT)?),
        ClientType::Tribler => Arc::new(TriblerClient::new(base_url, require(&record.api_key, "api_key")?, DEFAULT_TIMEOUT)?),
        ClientType::Mock => Arc::new(MockClient::new(record.category.clone().unwrap_or_else(|| "/downloads".to_string()))),
        ClientType::Nzbget => Arc::new(NzbgetClient),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use radarr_core::models::CleanupMode;

    fn record(client_type: &str) -> DownloadClientRecord {
        DownloadClientRecord {
            id: 1,
            name: "test".to_string(),
            client_type: client_type.to_string(),
            host: "localhost".to_string(),
            port: 8080,
            username: Some("admin".to_string()),
            password: Some("pw".to_string()),
            api_key: Some("key".to_string()),
            url_base: None,
            use_ssl: false,
            category: Some("radarr".to_string()),
            priority: 1,
            enabled: true,
            import_delay_seconds: 0,
            cleanup_mode: CleanupMode::Leave,
            seed_ratio_target: None,
        }
    }

    #[test]
    fn builds_every_known_client_type() {
        for tag in [
            "qbittorrent", "transmission", "vuze", "deluge", "sabnzbd", "rtorrent", "aria2",
            "utorrent", "flood", "hadouken", "downloadstation", "freeboxdownload", "rqbit",
            "tribler", "mock", "nzbget",
        ] {
            assert!(build_client(&record(tag)).is_ok(), "failed to build {tag}");
        }
    }

    #[test]
    fn unknown_client_type_errors() {
        assert!(build_client(&record("not-a-real-client")).is_err());
    }
}
