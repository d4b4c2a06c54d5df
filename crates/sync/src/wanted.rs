//! Wanted collector (§4.1) — reads four repository views and produces a
//! flat sequence of `SearchableItem`s, collapsing eligible episode groups
//! into a single season-pack item.
//!
//! Grounded in `core::services::rss_service.rs`'s "build the wanted set
//! before each cycle" shape, generalized from movie-only to the
//! season-collapsing rule this spec adds for TV.

use std::collections::HashMap;

use async_trait::async_trait;
use radarr_core::domain::repositories::{EpisodeRow, WantedRepository};
use radarr_core::models::{MediaStatus, MediaType, SearchableItem};
use radarr_core::Result;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Missing,
    Upgrade,
}

/// Injected per-item backoff gate; RSS sync uses `NoBackoff` (§4.5 step 2
/// — "RSS must not suppress any item"), autosearch injects a real one.
#[async_trait]
pub trait BackoffChecker: Send + Sync {
    async fn is_backed_off(&self, item_type: &str, item_id: &str, search_type: SearchType) -> bool;
}

pub struct NoBackoff;

#[async_trait]
impl BackoffChecker for NoBackoff {
    async fn is_backed_off(&self, _item_type: &str, _item_id: &str, _search_type: SearchType) -> bool {
        false
    }
}

/// Collects the full wanted set for one cycle.
pub async fn collect_wanted<R: WantedRepository + ?Sized>(
    repo: &R,
    backoff: &dyn BackoffChecker,
) -> Result<Vec<SearchableItem>> {
    let mut out = Vec::new();

    for item in repo.list_missing_movies().await? {
        if backoff.is_backed_off("movie", &item.media_id.to_string(), SearchType::Missing).await {
            continue;
        }
        out.push(item);
    }
    for item in repo.list_movie_upgrade_candidates().await? {
        if backoff.is_backed_off("movie", &item.media_id.to_string(), SearchType::Upgrade).await {
            continue;
        }
        out.push(item);
    }

    out.extend(collect_episode_group(
        repo,
        backoff,
        repo.list_missing_episodes().await?,
        SearchType::Missing,
    )
    .await?);
    out.extend(collect_episode_group(
        repo,
        backoff,
        repo.list_episode_upgrade_candidates().await?,
        SearchType::Upgrade,
    )
    .await?);

    Ok(out)
}

async fn collect_episode_group<R: WantedRepository + ?Sized>(
    repo: &R,
    backoff: &dyn BackoffChecker,
    rows: Vec<EpisodeRow>,
    search_type: SearchType,
) -> Result<Vec<SearchableItem>> {
    let mut groups: HashMap<(Uuid, i32), Vec<EpisodeRow>> = HashMap::new();
    for row in rows {
        groups.entry((row.series_id, row.season_number)).or_default().push(row);
    }

    let mut out = Vec::new();
    for ((series_id, season_number), group) in groups {
        let roster = repo.list_episodes_by_season(series_id, season_number).await?;
        let season = repo.get_season_by_number(series_id, season_number).await?;
        let season_monitored = season.map(|s| s.monitored).unwrap_or(false);

        let eligible = match search_type {
            SearchType::Missing => {
                season_monitored
                    && roster.len() >= 2
                    && roster.iter().all(|e| e.monitored)
                    && roster.iter().all(|e| e.status == MediaStatus::Missing)
            }
            SearchType::Upgrade => {
                let monitored: Vec<&EpisodeRow> = roster.iter().filter(|e| e.monitored).collect();
                season_monitored
                    && !monitored.is_empty()
                    && monitored.iter().all(|e| e.status == MediaStatus::Upgradable)
                    && monitored.len() >= 2
            }
        };

        if eligible {
            if backoff.is_backed_off("series", &series_id.to_string(), search_type).await {
                continue;
            }
            out.push(season_searchable_item(&group, series_id, season_number, search_type));
        } else {
            for ep in &group {
                if backoff
                    .is_backed_off("episode", &ep.episode_id.to_string(), search_type)
                    .await
                {
                    continue;
                }
                out.push(episode_searchable_item(ep));
            }
        }
    }
    Ok(out)
}

fn season_searchable_item(
    group: &[EpisodeRow],
    series_id: Uuid,
    season_number: i32,
    search_type: SearchType,
) -> SearchableItem {
    let first = &group[0];
    let has_file = search_type == SearchType::Upgrade;
    let current_quality_id = if has_file {
        group.iter().filter_map(|e| e.current_quality_id).max()
    } else {
        None
    };
    SearchableItem {
        media_type: MediaType::Season,
        media_id: series_id,
        title: first.title.clone(),
        year: first.year,
        imdb_id: first.imdb_id.clone(),
        tmdb_id: first.tmdb_id,
        tvdb_id: first.tvdb_id,
        series_id: Some(series_id),
        season_number: Some(season_number),
        episode_number: None,
        quality_profile_id: first.quality_profile_id,
        has_file,
        current_quality_id,
        target_slot_id: first.target_slot_id,
    }
}

fn episode_searchable_item(ep: &EpisodeRow) -> SearchableItem {
    SearchableItem {
        media_type: MediaType::Episode,
        media_id: ep.episode_id,
        title: ep.title.clone(),
        year: ep.year,
        imdb_id: ep.imdb_id.clone(),
        tmdb_id: ep.tmdb_id,
        tvdb_id: ep.tvdb_id,
        series_id: Some(ep.series_id),
        season_number: Some(ep.season_number),
        episode_number: Some(ep.episode_number),
        quality_profile_id: ep.quality_profile_id,
        has_file: ep.has_file,
        current_quality_id: ep.current_quality_id,
        target_slot_id: ep.target_slot_id,
    }
}
