//! The downloader service (§4.7): a pool of live client instances keyed
//! by clientID, a per-client queue snapshot cache, and the three
//! concurrent per-client operations (poll, completion check,
//! disappearance check), all bounded by a 5s per-client timeout.
//!
//! Grounded in `core::services::queue_processor::QueueProcessor`'s shape
//! (config struct, `Arc<Mutex<..>>` shared state, concurrent per-client
//! fan-out under `tokio::time::timeout`) adapted from the teacher's
//! single download-client design to the polymorphic pool this spec calls
//! for.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use radarr_core::domain::repositories::DownloadClientRepository;
use radarr_core::models::{
    CleanupMode, DownloadClientRecord, DownloadItem, DownloadMapping, MediaStatus,
};
use radarr_core::{RadarrError, Result};
use radarr_decision::parsed_media::parse_release_title;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::client::{target_subdirectory, AddOptions, ClientType, DownloadClient};
use crate::factory::build_client;

const PER_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A queue item enriched for the UI/API: live client state plus the
/// catalog mapping and a best-effort title parse, per §4.7.2.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub client_id: i32,
    pub download: DownloadItem,
    pub media_type_guess: String,
    pub quality: Option<String>,
    pub source: Option<String>,
    pub codec: Option<String>,
    pub attributes: Vec<String>,
    pub mapping: Option<DownloadMapping>,
}

#[derive(Debug, Clone)]
pub struct ClientError {
    pub client_id: i32,
    pub client_name: String,
    pub message: String,
}

#[derive(Debug, Default, Clone)]
pub struct QueueSnapshot {
    pub items: Vec<QueueItem>,
    pub errors: Vec<ClientError>,
}

#[derive(Debug, Clone)]
pub struct CompletedDownload {
    pub client_id: i32,
    pub download_id: String,
    pub download_path: String,
    pub size_bytes: Option<i64>,
    pub mapping: DownloadMapping,
}

/// Infers the enriched `mediaType` from a download's reported directory,
/// per §4.7.2 ("path containing SlipStream/Movies vs SlipStream/Series").
fn infer_media_type(download_dir: Option<&str>) -> String {
    match download_dir {
        Some(dir) if dir.contains(target_subdirectory(false)) => "movie".to_string(),
        Some(dir) if dir.contains(target_subdirectory(true)) => "series".to_string(),
        _ => "unknown".to_string(),
    }
}

/// Owns the client pool and per-client queue snapshot cache (§4.7).
pub struct DownloaderService<R: DownloadClientRepository> {
    repo: Arc<R>,
    pool: RwLock<HashMap<i32, (Arc<dyn DownloadClient>, DownloadClientRecord)>>,
    snapshot_cache: RwLock<HashMap<i32, Vec<DownloadItem>>>,
}

impl<R: DownloadClientRepository + 'static> DownloaderService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            repo,
            pool: RwLock::new(HashMap::new()),
            snapshot_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Evicts a client from the pool (update/delete), per §4.7's "owns a
    /// pool... evicts on update/delete".
    pub async fn evict(&self, client_id: i32) {
        self.pool.write().await.remove(&client_id);
        self.snapshot_cache.write().await.remove(&client_id);
    }

    async fn get_or_build(&self, record: &DownloadClientRecord) -> Result<Arc<dyn DownloadClient>> {
        {
            let pool = self.pool.read().await;
            if let Some((client, cached)) = pool.get(&record.id) {
                if cached.client_type == record.client_type && cached.host == record.host && cached.port == record.port {
                    return Ok(client.clone());
                }
            }
        }
        let client = build_client(record)?;
        self.pool.write().await.insert(record.id, (client.clone(), record.clone()));
        Ok(client)
    }

    /// §4.7.2: `GetQueue` — concurrent per-client `List`, excluding
    /// completed/seeding/fully-downloaded items, falling back to the
    /// cached snapshot for a client whose poll fails.
    pub async fn get_queue(&self) -> Result<QueueSnapshot> {
        let clients = self.repo.list_enabled_download_clients().await?;
        let mappings = self.repo.list_active_download_mappings().await?;

        let mut snapshot = QueueSnapshot::default();
        let mut tasks = Vec::new();

        for record in clients {
            if ClientType::from_str_tag(&record.client_type).is_err() {
                continue;
            }
            let client = match self.get_or_build(&record).await {
                Ok(c) => c,
                Err(e) => {
                    snapshot.errors.push(ClientError {
                        client_id: record.id,
                        client_name: record.name.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            tasks.push(async move {
                let result = tokio::time::timeout(PER_CLIENT_TIMEOUT, client.list()).await;
                (record, result)
            });
        }

        let results = futures::future::join_all(tasks).await;

        for (record, result) in results {
            let items = match result {
                Ok(Ok(items)) => {
                    self.snapshot_cache.write().await.insert(record.id, items.clone());
                    items
                }
                Ok(Err(e)) => {
                    warn!(client = %record.name, error = %e, "queue poll failed, using cached snapshot");
                    snapshot.errors.push(ClientError {
                        client_id: record.id,
                        client_name: record.name.clone(),
                        message: e.to_string(),
                    });
                    self.snapshot_cache.read().await.get(&record.id).cloned().unwrap_or_default()
                }
                Err(_) => {
                    warn!(client = %record.name, "queue poll timed out after 5s, using cached snapshot");
                    snapshot.errors.push(ClientError {
                        client_id: record.id,
                        client_name: record.name.clone(),
                        message: "poll timed out after 5s".to_string(),
                    });
                    self.snapshot_cache.read().await.get(&record.id).cloned().unwrap_or_default()
                }
            };

            for download in items {
                if download.is_complete() {
                    continue;
                }
                let parsed = parse_release_title(&download.name);
                let mapping = mappings
                    .iter()
                    .find(|m| m.client_id == record.id && m.download_id == download.id)
                    .cloned();
                snapshot.items.push(QueueItem {
                    client_id: record.id,
                    media_type_guess: infer_media_type(download.download_dir.as_deref()),
                    quality: parsed.resolution.clone(),
                    source: Some(format!("{:?}", parsed.source)),
                    codec: parsed.codec.clone(),
                    attributes: parsed.attributes.clone(),
                    download,
                    mapping,
                });
            }
        }

        Ok(snapshot)
    }

    /// §4.7.3: completion detection, concurrency identical to `get_queue`.
    pub async fn detect_completed(&self) -> Result<Vec<CompletedDownload>> {
        let clients = self.repo.list_enabled_download_clients().await?;
        let mappings = self.repo.list_active_download_mappings().await?;
        let mut completed = Vec::new();

        let mut tasks = Vec::new();
        for record in &clients {
            let Ok(client) = self.get_or_build(record).await else { continue };
            let record = record.clone();
            tasks.push(async move {
                let result = tokio::time::timeout(PER_CLIENT_TIMEOUT, client.list()).await;
                (record, result)
            });
        }
        let results = futures::future::join_all(tasks).await;

        for (record, result) in results {
            let Ok(Ok(items)) = result else { continue };
            for download in items {
                if !download.is_complete() {
                    continue;
                }
                let Some(mapping) = mappings
                    .iter()
                    .find(|m| m.client_id == record.id && m.download_id == download.id)
                else {
                    continue;
                };
                let download_dir = download.download_dir.clone().unwrap_or_default();
                completed.push(CompletedDownload {
                    client_id: record.id,
                    download_id: download.id.clone(),
                    download_path: format!("{}/{}", download_dir.trim_end_matches('/'), download.name),
                    size_bytes: download.size_bytes,
                    mapping: mapping.clone(),
                });
            }
        }

        Ok(completed)
    }

    /// §4.7.4: disappearance detection — catalog rows stuck "downloading"
    /// whose `activeDownloadID` is no longer live on any client.
    pub async fn detect_disappeared(&self) -> Result<usize> {
        let clients = self.repo.list_enabled_download_clients().await?;
        let mut live_ids: std::collections::HashSet<String> = std::collections::HashSet::new();

        let mut tasks = Vec::new();
        for record in &clients {
            let Ok(client) = self.get_or_build(record).await else { continue };
            tasks.push(async move { tokio::time::timeout(PER_CLIENT_TIMEOUT, client.list()).await });
        }
        for result in futures::future::join_all(tasks).await {
            if let Ok(Ok(items)) = result {
                live_ids.extend(items.into_iter().map(|i| i.id));
            }
        }

        let mappings = self.repo.list_active_download_mappings().await?;
        let mut marked_failed = 0usize;
        let downloading_movies = self.repo.list_downloading_movies().await?;
        let downloading_episodes = self.repo.list_downloading_episodes().await?;

        for item in downloading_movies.into_iter().chain(downloading_episodes) {
            let Some(download_id) = &item.active_download_id else { continue };
            if download_id.starts_with("mock-") || live_ids.contains(download_id) {
                continue;
            }
            let update_result = match item.series_id {
                Some(_) => {
                    self.repo
                        .update_episode_status_with_details(
                            item.media_id,
                            MediaStatus::Failed,
                            None,
                            Some("Download removed from client".to_string()),
                        )
                        .await
                }
                None => {
                    self.repo
                        .update_movie_status_with_details(
                            item.media_id,
                            MediaStatus::Failed,
                            None,
                            Some("Download removed from client".to_string()),
                        )
                        .await
                }
            };
            match update_result {
                Ok(()) => {
                    info!(media_id = %item.media_id, "download disappeared from client, marked failed");
                    marked_failed += 1;
                }
                Err(e) => {
                    error!(media_id = %item.media_id, error = %e, "failed to mark disappeared download as failed");
                    continue;
                }
            }

            // §4.7.5/§8: a failed grab must release its mapping's slot so a
            // later grab for this item isn't blocked by a stale
            // `targetSlotID`, the same cleanup `handle_failed_download` does
            // for a grab that fails synchronously.
            if let Some(mapping) = mappings.iter().find(|m| &m.download_id == download_id) {
                if let Err(e) = self.handle_failed_download(mapping.id).await {
                    error!(mapping_id = %mapping.id, error = %e, "failed to clear mapping for disappeared download");
                }
            }
        }

        Ok(marked_failed)
    }

    /// §4.7.5: grab workflow. Returns the driver's download ID; callers
    /// pair this with `create_download_mapping`.
    pub async fn add_torrent(
        &self,
        client_id: i32,
        url: Option<&str>,
        content: Option<&[u8]>,
        category: Option<&str>,
        is_tv: bool,
    ) -> Result<String> {
        let clients = self.repo.list_enabled_download_clients().await?;
        let record = clients
            .into_iter()
            .find(|c| c.id == client_id)
            .ok_or_else(|| RadarrError::ClientNotFound { id: client_id.to_string() })?;
        let client = self.get_or_build(&record).await?;

        let base_dir = client.get_download_dir().await?;
        let subdir = target_subdirectory(is_tv);
        let download_dir = client.resolve_download_path(&base_dir, subdir);

        let opts = AddOptions {
            url,
            magnet: None,
            content,
            category,
            download_dir: &download_dir,
            paused: true,
        };
        let download_id = client.add(&opts).await?;
        client.resume(&download_id).await?;
        debug!(client = %record.name, download_id, "grabbed release");
        Ok(download_id)
    }

    /// Called by callers on grab failure: clears the mapping's slot, then
    /// deletes it (no retry state is kept, per §4.7.5).
    pub async fn handle_failed_download(&self, mapping_id: uuid::Uuid) -> Result<()> {
        self.repo.clear_download_mapping_slot(mapping_id).await?;
        self.repo.delete_download_mapping(mapping_id).await
    }
}

/// Cleanup decision for a completed download once its import has run,
/// grounded in `DownloadClientRecord::cleanup_mode` (§3).
pub fn should_delete_after_import(cleanup_mode: CleanupMode) -> bool {
    matches!(cleanup_mode, CleanupMode::DeleteAfterImport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_media_type_from_subdirectory() {
        assert_eq!(infer_media_type(Some("/downloads/SlipStream/Movies/Dune")), "movie");
        assert_eq!(infer_media_type(Some("/downloads/SlipStream/Series/Show")), "series");
        assert_eq!(infer_media_type(Some("/downloads/misc")), "unknown");
    }
}
