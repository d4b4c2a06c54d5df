//! SABnzbd client over its `api?mode=...&apikey=...` query-string API.
//!
//! Only usenet driver that gets a full implementation (§6 names SABnzbd as
//! the reference usenet client); `nzbget` is left an explicit stub per
//! spec. Grounded in `qbittorrent.rs`'s client-construction shape, adapted
//! to SABnzbd's stateless API-key auth (no login/session handshake).

use std::time::Duration;

use async_trait::async_trait;
use radarr_core::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use radarr_core::models::{DownloadItem, DownloadItemStatus};
use radarr_core::{RadarrError, Result};
use reqwest::Client;
use serde_json::Value;

use crate::client::{AddOptions, ClientType, DownloadClient, Protocol, UsenetClient};

#[derive(Debug, Clone)]
pub struct SabnzbdConfig {
    pub base_url: String,
    pub api_key: String,
    pub category: Option<String>,
    pub timeout: u64,
}

pub struct SabnzbdClient {
    config: SabnzbdConfig,
    client: Client,
    circuit_breaker: CircuitBreaker,
}

impl SabnzbdClient {
    pub fn new(config: SabnzbdConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| RadarrError::InvalidClient {
                client: "sabnzbd".to_string(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            config,
            client,
            circuit_breaker: CircuitBreaker::new(
                CircuitBreakerConfig::new("SABnzbd")
                    .with_failure_threshold(3)
                    .with_timeout(Duration::from_secs(30)),
            ),
        })
    }

    fn api_url(&self, mode: &str, extra: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}/api?mode={mode}&apikey={}&output=json",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_key
        );
        for (k, v) in extra {
            url.push('&');
            url.push_str(&::urlencoding::encode(k));
            url.push('=');
            url.push_str(&::urlencoding::encode(v));
        }
        url
    }

    async fn get_json(&self, url: String) -> Result<Value> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RadarrError::ExternalServiceError {
                service: "SABnzbd".to_string(),
                error: format!("request failed: {e}"),
            })?;
        if !response.status().is_success() {
            return Err(RadarrError::ExternalServiceError {
                service: "SABnzbd".to_string(),
                error: format!("request failed with status {}", response.status()),
            });
        }
        response.json().await.map_err(|e| RadarrError::ExternalServiceError {
            service: "SABnzbd".to_string(),
            error: format!("failed to parse response: {e}"),
        })
    }

    fn map_status(status: &str) -> DownloadItemStatus {
        match status {
            "Downloading" => DownloadItemStatus::Downloading,
            "Paused" => DownloadItemStatus::Paused,
            "Queued" => DownloadItemStatus::Queued,
            "Completed" => DownloadItemStatus::Completed,
            "Failed" => DownloadItemStatus::Error,
            "Extracting" | "Repairing" | "Verifying" => DownloadItemStatus::Warning,
            _ => DownloadItemStatus::Unknown,
        }
    }

    fn parse_slot(v: &Value, queued: bool) -> DownloadItem {
        let pct = v
            .get("percentage")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(if queued { 0.0 } else { 100.0 });
        DownloadItem {
            id: v.get("nzo_id").and_then(Value::as_str).unwrap_or_default().to_string(),
            name: v.get("filename").and_then(Value::as_str).unwrap_or_default().to_string(),
            status: v
                .get("status")
                .and_then(Value::as_str)
                .map(Self::map_status)
                .unwrap_or(DownloadItemStatus::Unknown),
            progress: pct,
            size_bytes: None,
            downloaded_bytes: None,
            download_speed: None,
            upload_speed: None,
            eta_seconds: -1,
            download_dir: None,
            added_at: None,
            completed_at: None,
            error: v
                .get("status")
                .and_then(Value::as_str)
                .filter(|s| *s == "Failed")
                .map(|_| "job failed".to_string()),
        }
    }
}

#[async_trait]
impl DownloadClient for SabnzbdClient {
    fn client_type(&self) -> ClientType {
        ClientType::Sabnzbd
    }

    fn protocol(&self) -> Protocol {
        Protocol::Usenet
    }

    async fn test(&self) -> Result<()> {
        self.circuit_breaker
            .call(async {
                let v = self.get_json(self.api_url("version", &[])).await?;
                if v.get("version").is_none() {
                    return Err(RadarrError::InvalidClient {
                        client: "sabnzbd".to_string(),
                        message: "version response missing version field".to_string(),
                    });
                }
                Ok(())
            })
            .await
    }

    async fn connect(&self) -> Result<()> {
        self.get_json(self.api_url("version", &[])).await.map(|_| ())
    }

    async fn add(&self, opts: &AddOptions<'_>) -> Result<String> {
        let category = opts.category.or(self.config.category.as_deref()).unwrap_or("*");
        let nzb_url = opts.url.ok_or_else(|| RadarrError::InvalidClient {
            client: "sabnzbd".to_string(),
            message: "SABnzbd only supports add-by-url (no magnet/content)".to_string(),
        })?;
        let v = self
            .get_json(self.api_url("addurl", &[("name", nzb_url), ("cat", category)]))
            .await?;
        let nzo_ids = v.get("nzo_ids").and_then(Value::as_array);
        nzo_ids
            .and_then(|a| a.first())
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RadarrError::ExternalServiceError {
                service: "SABnzbd".to_string(),
                error: "addurl response missing nzo_ids".to_string(),
            })
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        let mut items = self.get_queue().await?;
        items.extend(self.get_history().await?);
        Ok(items)
    }

    async fn get(&self, id: &str) -> Result<DownloadItem> {
        self.list()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| RadarrError::ClientNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str, delete_files: bool) -> Result<()> {
        let mode = if delete_files { "delete" } else { "remove" };
        self.get_json(self.api_url("queue", &[("name", mode), ("value", id)]))
            .await
            .map(|_| ())
    }

    async fn pause(&self, id: &str) -> Result<()> {
        self.get_json(self.api_url("queue", &[("name", "pause"), ("value", id)]))
            .await
            .map(|_| ())
    }

    async fn resume(&self, id: &str) -> Result<()> {
        self.get_json(self.api_url("queue", &[("name", "resume"), ("value", id)]))
            .await
            .map(|_| ())
    }

    async fn get_download_dir(&self) -> Result<String> {
        let v = self
            .get_json(self.api_url("get_config", &[("section", "misc"), ("keyword", "complete_dir")]))
            .await?;
        v.pointer("/config/misc/complete_dir")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RadarrError::InvalidClient {
                client: "sabnzbd".to_string(),
                message: "get_config missing complete_dir".to_string(),
            })
    }
}

#[async_trait]
impl UsenetClient for SabnzbdClient {
    async fn get_queue(&self) -> Result<Vec<DownloadItem>> {
        let v = self.get_json(self.api_url("queue", &[])).await?;
        let slots = v.pointer("/queue/slots").and_then(Value::as_array).cloned().unwrap_or_default();
        Ok(slots.iter().map(|s| Self::parse_slot(s, true)).collect())
    }

    async fn get_history(&self) -> Result<Vec<DownloadItem>> {
        let v = self.get_json(self.api_url("history", &[])).await?;
        let slots = v.pointer("/history/slots").and_then(Value::as_array).cloned().unwrap_or_default();
        Ok(slots.iter().map(|s| Self::parse_slot(s, false)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status() {
        assert_eq!(SabnzbdClient::map_status("Completed"), DownloadItemStatus::Completed);
        assert_eq!(SabnzbdClient::map_status("Failed"), DownloadItemStatus::Error);
    }
}
