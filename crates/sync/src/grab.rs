//! Grab execution (§4.6 step 6, §4.7.5) — selects a download client and
//! hands the chosen release to `DownloaderService::add_torrent`, then
//! records the resulting mapping.
//!
//! Grounded in `core::services::workflow.rs`'s grab step, which picks the
//! lowest-`priority`-value enabled client and wraps the add+mapping pair
//! in a single fallible unit.

use radarr_core::domain::repositories::DownloadClientRepository;
use radarr_core::models::{DownloadClientRecord, DownloadMapping, MediaType, ReleaseInfo, SearchableItem};
use radarr_core::{RadarrError, Result};
use radarr_downloaders::DownloaderService;
use uuid::Uuid;

pub struct GrabRequest<'a> {
    pub release: &'a ReleaseInfo,
    pub wanted_item: &'a SearchableItem,
    pub is_season_pack: bool,
    pub target_slot_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct GrabOutcome {
    pub client_id: i32,
    pub client_name: String,
    pub download_id: String,
    pub mapping: DownloadMapping,
}

/// Picks the enabled client with the lowest `priority` value (0 = highest
/// priority), matching the teacher's client-selection convention.
fn pick_client(clients: &[DownloadClientRecord]) -> Option<&DownloadClientRecord> {
    clients.iter().min_by_key(|c| c.priority)
}

/// §4.7.5: resolves a client, adds the release, and persists the
/// resulting `DownloadMapping`. On add failure, no mapping row is ever
/// created — the caller has nothing to clean up.
pub async fn execute_grab<R: DownloadClientRepository + 'static>(
    service: &DownloaderService<R>,
    repo: &R,
    request: GrabRequest<'_>,
) -> Result<GrabOutcome> {
    let clients = repo.list_enabled_download_clients().await?;
    let client = pick_client(&clients)
        .ok_or_else(|| RadarrError::ClientNotFound { id: "none enabled".to_string() })?
        .clone();

    let is_tv = request.wanted_item.media_type == MediaType::Episode || request.wanted_item.media_type == MediaType::Season;
    let content_url = request.release.download_url.as_str();

    let download_id = service
        .add_torrent(client.id, Some(content_url), None, client.category.as_deref(), is_tv)
        .await?;

    let mapping = DownloadMapping {
        id: Uuid::new_v4(),
        client_id: client.id,
        download_id: download_id.clone(),
        movie_id: matches!(request.wanted_item.media_type, MediaType::Movie).then_some(request.wanted_item.media_id),
        series_id: request.wanted_item.series_id,
        season_number: request.wanted_item.season_number,
        episode_id: matches!(request.wanted_item.media_type, MediaType::Episode).then_some(request.wanted_item.media_id),
        is_season_pack: request.is_season_pack,
        is_complete_series: false,
        target_slot_id: request.target_slot_id,
    };
    let mapping = repo.create_download_mapping(&mapping).await?;

    Ok(GrabOutcome { client_id: client.id, client_name: client.name.clone(), download_id, mapping })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(id: i32, priority: i32) -> DownloadClientRecord {
        DownloadClientRecord {
            id,
            name: format!("client-{id}"),
            client_type: "qbittorrent".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            username: None,
            password: None,
            api_key: None,
            url_base: None,
            use_ssl: false,
            category: None,
            priority,
            enabled: true,
            import_delay_seconds: 0,
            cleanup_mode: radarr_core::models::CleanupMode::Leave,
            seed_ratio_target: None,
        }
    }

    #[test]
    fn picks_lowest_priority_value() {
        let clients = vec![client(1, 50), client(2, 10), client(3, 30)];
        assert_eq!(pick_client(&clients).unwrap().id, 2);
    }

    #[test]
    fn empty_client_list_has_no_pick() {
        assert!(pick_client(&[]).is_none());
    }
}
