//! In-memory mock driver used by `crates/sync`'s integration tests and by
//! deployments that want a `Mock` client type in the registry without a
//! real downstream service. No network calls at all.

use std::sync::Mutex;

use async_trait::async_trait;
use radarr_core::models::{DownloadItem, DownloadItemStatus};
use radarr_core::{RadarrError, Result};

use crate::client::{AddOptions, ClientType, DownloadClient, Protocol, TorrentClient};

pub struct MockClient {
    download_dir: String,
    items: Mutex<Vec<DownloadItem>>,
    next_id: Mutex<u64>,
}

impl MockClient {
    pub fn new(download_dir: impl Into<String>) -> Self {
        Self {
            download_dir: download_dir.into(),
            items: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
        }
    }

    /// Test hook: mark an item complete without going through `add`.
    pub fn complete(&self, id: &str) {
        let mut items = self.items.lock().unwrap();
        if let Some(item) = items.iter_mut().find(|i| i.id == id) {
            item.status = DownloadItemStatus::Completed;
            item.progress = 100.0;
        }
    }
}

#[async_trait]
impl DownloadClient for MockClient {
    fn client_type(&self) -> ClientType {
        ClientType::Mock
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn test(&self) -> Result<()> {
        Ok(())
    }

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn add(&self, opts: &AddOptions<'_>) -> Result<String> {
        let mut next_id = self.next_id.lock().unwrap();
        let id = format!("mock-{}", *next_id);
        *next_id += 1;
        self.items.lock().unwrap().push(DownloadItem {
            id: id.clone(),
            name: opts
                .url
                .or(opts.magnet)
                .unwrap_or("mock-download")
                .to_string(),
            status: if opts.paused {
                DownloadItemStatus::Paused
            } else {
                DownloadItemStatus::Downloading
            },
            progress: 0.0,
            size_bytes: Some(1_000_000_000),
            downloaded_bytes: Some(0),
            download_speed: Some(1_000_000),
            upload_speed: Some(0),
            eta_seconds: 600,
            download_dir: Some(opts.download_dir.to_string()),
            added_at: None,
            completed_at: None,
            error: None,
        });
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        Ok(self.items.lock().unwrap().clone())
    }

    async fn get(&self, id: &str) -> Result<DownloadItem> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| RadarrError::ClientNotFound { id: id.to_string() })
    }

    async fn remove(&self, id: &str, _delete_files: bool) -> Result<()> {
        self.items.lock().unwrap().retain(|i| i.id != id);
        Ok(())
    }

    async fn pause(&self, id: &str) -> Result<()> {
        if let Some(item) = self.items.lock().unwrap().iter_mut().find(|i| i.id == id) {
            item.status = DownloadItemStatus::Paused;
        }
        Ok(())
    }

    async fn resume(&self, id: &str) -> Result<()> {
        if let Some(item) = self.items.lock().unwrap().iter_mut().find(|i| i.id == id) {
            item.status = DownloadItemStatus::Downloading;
        }
        Ok(())
    }

    async fn get_download_dir(&self) -> Result<String> {
        Ok(self.download_dir.clone())
    }
}

#[async_trait]
impl TorrentClient for MockClient {
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

    async fn set_seed_limits(&self, _id: &str, _ratio: Option<f64>) -> Result<()> {
        Ok(())
    }

    async fn get_torrent_info(&self, id: &str) -> Result<DownloadItem> {
        DownloadClient::get(self, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_complete_then_list_reflects_status() {
        let client = MockClient::new("/downloads");
        let id = client
            .add(&AddOptions {
                url: Some("magnet:?xt=urn:btih:abc"),
                magnet: None,
                content: None,
                category: None,
                download_dir: "/downloads/Movies",
                paused: false,
            })
            .await
            .unwrap();
        assert_eq!(client.list().await.unwrap().len(), 1);
        client.complete(&id);
        let item = client.get(&id).await.unwrap();
        assert!(item.is_complete());
    }

    #[tokio::test]
    async fn get_missing_id_errors() {
        let client = MockClient::new("/downloads");
        assert!(client.get("nope").await.is_err());
    }
}
