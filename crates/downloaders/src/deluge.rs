//! Deluge client over its JSON-RPC Web API (`/json`), authenticated with a
//! password-only `auth.login` call whose session is a cookie jar, mirroring
//! `qbittorrent.rs`'s `cookie_store(true)` client construction.

use std::time::Duration;

use async_trait::async_trait;
use radarr_core::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use radarr_core::models::{DownloadItem, DownloadItemStatus};
use radarr_core::{RadarrError, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::{AddOptions, ClientType, DownloadClient, Protocol, TorrentClient};

#[derive(Debug, Clone)]
pub struct DelugeConfig {
    pub base_url: String,
    pub password: String,
    pub timeout: u64,
}

pub struct DelugeClient {
    config: DelugeConfig,
    client: Client,
    json_url: String,
    request_id: RwLock<u64>,
    circuit_breaker: CircuitBreaker,
}

impl DelugeClient {
    pub fn new(config: DelugeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .cookie_store(true)
            .build()
            .map_err(|e| RadarrError::InvalidClient {
                client: "deluge".to_string(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        let json_url = format!("{}/json", config.base_url.trim_end_matches('/'));
        Ok(Self {
            config,
            client,
            json_url,
            request_id: RwLock::new(0),
            circuit_breaker: CircuitBreaker::new(
                CircuitBreakerConfig::new("Deluge")
                    .with_failure_threshold(3)
                    .with_timeout(Duration::from_secs(30)),
            ),
        })
    }

    async fn next_id(&self) -> u64 {
        let mut id = self.request_id.write().await;
        *id += 1;
        *id
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id().await;
        let body = json!({ "method": method, "params": params, "id": id });
        let response = self
            .client
            .post(&self.json_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RadarrError::ExternalServiceError {
                service: "Deluge".to_string(),
                error: format!("request failed: {e}"),
            })?;
        let parsed: Value = response
            .json()
            .await
            .map_err(|e| RadarrError::ExternalServiceError {
                service: "Deluge".to_string(),
                error: format!("failed to parse response: {e}"),
            })?;
        if let Some(err) = parsed.get("error").filter(|e| !e.is_null()) {
            return Err(RadarrError::ExternalServiceError {
                service: "Deluge".to_string(),
                error: format!("RPC error: {err}"),
            });
        }
        Ok(parsed.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn login(&self) -> Result<()> {
        let authed = self
            .call("auth.login", json!([self.config.password]))
            .await?;
        if authed.as_bool() != Some(true) {
            return Err(RadarrError::AuthFailed {
                client: "deluge".to_string(),
                message: "auth.login returned false".to_string(),
            });
        }
        debug!("authenticated with Deluge daemon");
        Ok(())
    }

    fn map_state(state: &str) -> DownloadItemStatus {
        match state {
            "Downloading" => DownloadItemStatus::Downloading,
            "Seeding" => DownloadItemStatus::Seeding,
            "Paused" => DownloadItemStatus::Paused,
            "Queued" | "Allocating" | "Checking" => DownloadItemStatus::Queued,
            "Error" => DownloadItemStatus::Error,
            _ => DownloadItemStatus::Unknown,
        }
    }
}

#[async_trait]
impl DownloadClient for DelugeClient {
    fn client_type(&self) -> ClientType {
        ClientType::Deluge
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn test(&self) -> Result<()> {
        self.circuit_breaker
            .call(async {
                self.login().await?;
                self.call("web.connected", json!([])).await.map(|_| ())
            })
            .await
    }

    async fn connect(&self) -> Result<()> {
        self.login().await
    }

    async fn add(&self, opts: &AddOptions<'_>) -> Result<String> {
        self.login().await?;
        let options = json!({ "download_location": opts.download_dir });
        let result = if let Some(url) = opts.url.or(opts.magnet) {
            self.call("core.add_torrent_magnet", json!([url, options])).await?
        } else if let Some(content) = opts.content {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(content);
            self.call(
                "core.add_torrent_file",
                json!(["release.torrent", encoded, options]),
            )
            .await?
        } else {
            return Err(RadarrError::InvalidClient {
                client: "deluge".to_string(),
                message: "add requires a url, magnet or content".to_string(),
            });
        };
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RadarrError::ExternalServiceError {
                service: "Deluge".to_string(),
                error: "add_torrent did not return an info hash".to_string(),
            })
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        self.login().await?;
        let fields = json!(["name", "state", "progress", "total_size", "total_done",
            "download_payload_rate", "upload_payload_rate", "eta", "save_path", "message"]);
        let result = self.call("core.get_torrents_status", json!([{}, fields])).await?;
        let Some(map) = result.as_object() else {
            return Ok(Vec::new());
        };
        Ok(map
            .iter()
            .map(|(hash, v)| DownloadItem {
                id: hash.clone(),
                name: v.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                status: v
                    .get("state")
                    .and_then(Value::as_str)
                    .map(Self::map_state)
                    .unwrap_or(DownloadItemStatus::Unknown),
                progress: v.get("progress").and_then(Value::as_f64).unwrap_or(0.0),
                size_bytes: v.get("total_size").and_then(Value::as_i64),
                downloaded_bytes: v.get("total_done").and_then(Value::as_i64),
                download_speed: v.get("download_payload_rate").and_then(Value::as_u64),
                upload_speed: v.get("upload_payload_rate").and_then(Value::as_u64),
                eta_seconds: v.get("eta").and_then(Value::as_i64).unwrap_or(-1),
                download_dir: v.get("save_path").and_then(Value::as_str).map(str::to_string),
                added_at: None,
                completed_at: None,
                error: v
                    .get("message")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<DownloadItem> {
        self.list()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| RadarrError::ClientNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str, delete_files: bool) -> Result<()> {
        self.login().await?;
        self.call("core.remove_torrent", json!([id, delete_files])).await.map(|_| ())
    }

    async fn pause(&self, id: &str) -> Result<()> {
        self.login().await?;
        self.call("core.pause_torrent", json!([[id]])).await.map(|_| ())
    }

    async fn resume(&self, id: &str) -> Result<()> {
        self.login().await?;
        self.call("core.resume_torrent", json!([[id]])).await.map(|_| ())
    }

    async fn get_download_dir(&self) -> Result<String> {
        self.login().await?;
        let result = self.call("core.get_config_value", json!(["download_location"])).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RadarrError::InvalidClient {
                client: "deluge".to_string(),
                message: "config value download_location missing".to_string(),
            })
    }
}

#[async_trait]
impl TorrentClient for DelugeClient {
    async fn add_magnet(&self, magnet: &str, download_dir: &str) -> Result<String> {
        self.add(&AddOptions {
            url: None,
            magnet: Some(magnet),
            content: None,
            category: None,
            download_dir,
            paused: false,
        })
        .await
    }

    async fn set_seed_limits(&self, id: &str, ratio: Option<f64>) -> Result<()> {
        self.login().await?;
        self.call(
            "core.set_torrent_options",
            json!([[id], { "stop_at_ratio": ratio.is_some(), "stop_ratio": ratio.unwrap_or(0.0) }]),
        )
        .await
        .map(|_| ())
    }

    async fn get_torrent_info(&self, id: &str) -> Result<DownloadItem> {
        DownloadClient::get(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_states() {
        assert_eq!(DelugeClient::map_state("Seeding"), DownloadItemStatus::Seeding);
        assert_eq!(DelugeClient::map_state("Error"), DownloadItemStatus::Error);
        assert_eq!(DelugeClient::map_state("Weird"), DownloadItemStatus::Unknown);
    }
}
