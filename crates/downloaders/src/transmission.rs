//! Transmission RPC client (also used for Vuze's Transmission-compatible
//! RPC endpoint, gated on `rpc-version >= 14`).
//!
//! Grounded in `qbittorrent.rs`'s overall shape (config struct, reqwest
//! client, circuit breaker, reauth-once retry) adapted to Transmission's
//! session-id handshake: every request carries `X-Transmission-Session-Id`;
//! a `409 Conflict` response carries the *correct* id in the same header
//! and the request must be retried once with it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use async_trait::async_trait;
use radarr_core::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use radarr_core::models::{DownloadItem, DownloadItemStatus};
use radarr_core::{RadarrError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::client::{AddOptions, ClientType, DownloadClient, Protocol, TorrentClient};

const SESSION_HEADER: &str = "X-Transmission-Session-Id";
const MIN_RPC_VERSION: i64 = 14;

#[derive(Debug, Clone)]
pub struct TransmissionConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: u64,
    /// `true` selects the Vuze RPC-compatibility driver identity; the wire
    /// protocol is otherwise identical.
    pub is_vuze: bool,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9091".to_string(),
            username: None,
            password: None,
            timeout: 30,
            is_vuze: false,
        }
    }
}

pub struct TransmissionClient {
    config: TransmissionConfig,
    client: Client,
    rpc_url: String,
    session_id: Arc<RwLock<Option<String>>>,
    circuit_breaker: CircuitBreaker,
}

#[derive(Debug, Serialize, Deserialize)]
struct RpcRequest {
    method: String,
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: String,
    #[serde(default)]
    arguments: Value,
}

impl TransmissionClient {
    pub fn new(config: TransmissionConfig) -> Result<Self> {
        let rpc_url = format!("{}/transmission/rpc", config.base_url.trim_end_matches('/'));
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| RadarrError::InvalidClient {
                client: "transmission".to_string(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        let name = if config.is_vuze { "Vuze" } else { "Transmission" };
        let cb = CircuitBreaker::new(
            CircuitBreakerConfig::new(name)
                .with_failure_threshold(3)
                .with_timeout(Duration::from_secs(30))
                .with_request_timeout(Duration::from_secs(config.timeout)),
        );

        Ok(Self {
            config,
            client,
            rpc_url,
            session_id: Arc::new(RwLock::new(None)),
            circuit_breaker: cb,
        })
    }

    fn name(&self) -> &'static str {
        if self.config.is_vuze {
            "Vuze"
        } else {
            "Transmission"
        }
    }

    async fn rpc(&self, method: &str, arguments: Value) -> Result<Value> {
        let body = RpcRequest {
            method: method.to_string(),
            arguments,
        };

        let session = self.session_id.read().await.clone();
        let mut req = self.client.post(&self.rpc_url).json(&body);
        if let Some(id) = &session {
            req = req.header(SESSION_HEADER, id);
        }
        if let (Some(u), Some(p)) = (&self.config.username, &self.config.password) {
            req = req.basic_auth(u, Some(p));
        }

        let response = req.send().await.map_err(|e| RadarrError::ExternalServiceError {
            service: self.name().to_string(),
            error: format!("RPC request failed: {e}"),
        })?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            if let Some(id) = response.headers().get(SESSION_HEADER) {
                let id = id.to_str().unwrap_or_default().to_string();
                *self.session_id.write().await = Some(id.clone());
                debug!("refreshed Transmission session id, retrying request");
                let mut retry = self.client.post(&self.rpc_url).json(&body).header(SESSION_HEADER, id);
                if let (Some(u), Some(p)) = (&self.config.username, &self.config.password) {
                    retry = retry.basic_auth(u, Some(p));
                }
                let response = retry.send().await.map_err(|e| RadarrError::ExternalServiceError {
                    service: self.name().to_string(),
                    error: format!("RPC retry failed: {e}"),
                })?;
                return Self::parse_rpc(response, self.name()).await;
            }
        }

        Self::parse_rpc(response, self.name()).await
    }

    async fn parse_rpc(response: reqwest::Response, service: &str) -> Result<Value> {
        if !response.status().is_success() {
            return Err(RadarrError::ExternalServiceError {
                service: service.to_string(),
                error: format!("RPC failed with status {}", response.status()),
            });
        }
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| RadarrError::ExternalServiceError {
                service: service.to_string(),
                error: format!("failed to parse RPC response: {e}"),
            })?;
        if parsed.result != "success" {
            return Err(RadarrError::ExternalServiceError {
                service: service.to_string(),
                error: format!("RPC returned non-success result: {}", parsed.result),
            });
        }
        Ok(parsed.arguments)
    }

    fn map_status(status: i64) -> DownloadItemStatus {
        match status {
            0 => DownloadItemStatus::Paused,
            1 | 2 => DownloadItemStatus::Queued,
            3 => DownloadItemStatus::Downloading,
            4 => DownloadItemStatus::Queued,
            5 | 6 => DownloadItemStatus::Seeding,
            _ => DownloadItemStatus::Unknown,
        }
    }
}

#[async_trait]
impl DownloadClient for TransmissionClient {
    fn client_type(&self) -> ClientType {
        if self.config.is_vuze {
            ClientType::Vuze
        } else {
            ClientType::Transmission
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn test(&self) -> Result<()> {
        self.circuit_breaker
            .call(async {
                let args = self.rpc("session-get", json!({})).await?;
                let rpc_version = args.get("rpc-version").and_then(Value::as_i64).unwrap_or(0);
                if rpc_version < MIN_RPC_VERSION {
                    return Err(RadarrError::InvalidClient {
                        client: self.name().to_string(),
                        message: format!(
                            "rpc-version {rpc_version} is below the required minimum {MIN_RPC_VERSION}"
                        ),
                    });
                }
                Ok(())
            })
            .await
    }

    async fn connect(&self) -> Result<()> {
        self.rpc("session-get", json!({})).await.map(|_| ())
    }

    async fn add(&self, opts: &AddOptions<'_>) -> Result<String> {
        let mut args = json!({
            "download-dir": opts.download_dir,
            "paused": opts.paused,
        });
        if let Some(url) = opts.url.or(opts.magnet) {
            args["filename"] = json!(url);
        } else if let Some(content) = opts.content {
            use base64::Engine;
            args["metainfo"] = json!(base64::engine::general_purpose::STANDARD.encode(content));
        } else {
            return Err(RadarrError::InvalidClient {
                client: self.name().to_string(),
                message: "add requires a url, magnet or content".to_string(),
            });
        }

        let result = self.rpc("torrent-add", args).await?;
        let torrent = result
            .get("torrent-added")
            .or_else(|| result.get("torrent-duplicate"))
            .ok_or_else(|| RadarrError::ExternalServiceError {
                service: self.name().to_string(),
                error: "torrent-add returned neither torrent-added nor torrent-duplicate".to_string(),
            })?;
        torrent
            .get("hashString")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RadarrError::ExternalServiceError {
                service: self.name().to_string(),
                error: "torrent-add response missing hashString".to_string(),
            })
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        let fields = json!(["hashString", "name", "status", "percentDone", "totalSize",
            "haveValid", "rateDownload", "rateUpload", "eta", "downloadDir", "addedDate",
            "doneDate", "errorString"]);
        let result = self.rpc("torrent-get", json!({ "fields": fields })).await?;
        let torrents = result.get("torrents").and_then(Value::as_array).cloned().unwrap_or_default();
        Ok(torrents.iter().map(Self::item_from_json).collect())
    }

    async fn get(&self, id: &str) -> Result<DownloadItem> {
        self.list()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| RadarrError::ClientNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str, delete_files: bool) -> Result<()> {
        self.rpc(
            "torrent-remove",
            json!({ "ids": [id], "delete-local-data": delete_files }),
        )
        .await
        .map(|_| ())
    }

    async fn pause(&self, id: &str) -> Result<()> {
        self.rpc("torrent-stop", json!({ "ids": [id] })).await.map(|_| ())
    }

    async fn resume(&self, id: &str) -> Result<()> {
        self.rpc("torrent-start", json!({ "ids": [id] })).await.map(|_| ())
    }

    async fn get_download_dir(&self) -> Result<String> {
        let args = self.rpc("session-get", json!({})).await?;
        args.get("download-dir")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RadarrError::InvalidClient {
                client: self.name().to_string(),
                message: "session-get missing download-dir".to_string(),
            })
    }
}

impl TransmissionClient {
    fn item_from_json(v: &Value) -> DownloadItem {
        let total = v.get("totalSize").and_then(Value::as_i64);
        let have = v.get("haveValid").and_then(Value::as_i64);
        DownloadItem {
            id: v.get("hashString").and_then(Value::as_str).unwrap_or_default().to_string(),
            name: v.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
            status: v
                .get("status")
                .and_then(Value::as_i64)
                .map(Self::map_status)
                .unwrap_or(DownloadItemStatus::Unknown),
            progress: v.get("percentDone").and_then(Value::as_f64).unwrap_or(0.0) * 100.0,
            size_bytes: total,
            downloaded_bytes: have,
            download_speed: v.get("rateDownload").and_then(Value::as_u64),
            upload_speed: v.get("rateUpload").and_then(Value::as_u64),
            eta_seconds: v.get("eta").and_then(Value::as_i64).unwrap_or(-1),
            download_dir: v.get("downloadDir").and_then(Value::as_str).map(str::to_string),
            added_at: None,
            completed_at: None,
            error: v
                .get("errorString")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

#[async_trait]
impl TorrentClient for TransmissionClient {
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
        let args = match ratio {
            Some(r) => json!({ "ids": [id], "seedRatioLimit": r, "seedRatioMode": 1 }),
            None => json!({ "ids": [id], "seedRatioMode": 0 }),
        };
        self.rpc("torrent-set", args).await.map(|_| ())
    }

    async fn get_torrent_info(&self, id: &str) -> Result<DownloadItem> {
        warn!(id, "get_torrent_info delegates to get()");
        DownloadClient::get(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes() {
        assert_eq!(TransmissionClient::map_status(0), DownloadItemStatus::Paused);
        assert_eq!(TransmissionClient::map_status(3), DownloadItemStatus::Downloading);
        assert_eq!(TransmissionClient::map_status(6), DownloadItemStatus::Seeding);
    }

    #[test]
    fn client_type_follows_vuze_flag() {
        let mut cfg = TransmissionConfig::default();
        let c = TransmissionClient::new(cfg.clone()).unwrap();
        assert_eq!(c.client_type(), ClientType::Transmission);
        cfg.is_vuze = true;
        let c = TransmissionClient::new(cfg).unwrap();
        assert_eq!(c.client_type(), ClientType::Vuze);
    }
}
