//! `WantedIndex` + Matcher (§4.3) — the RSS path's release-to-wanted-item
//! correlation, built once per sync cycle.
//!
//! Grounded in `crates/indexers/src/multi_indexer.rs`'s per-result
//! dedup/lookup idiom, applied here to a four-way (title/imdb/tmdb/tvdb)
//! index instead of a single GUID set.

use std::collections::HashMap;

use radarr_core::domain::repositories::WantedRepository;
use radarr_core::models::{MediaStatus, MediaType, ReleaseInfo, SearchableItem};
use radarr_core::Result;
use radarr_decision::parsed_media::{parse_release_title, ParsedMedia};

/// Four lookup maps over the cycle's wanted set, keyed by normalized
/// title and by each external id.
#[derive(Default)]
pub struct WantedIndex {
    by_title: HashMap<String, Vec<SearchableItem>>,
    by_imdb: HashMap<String, Vec<SearchableItem>>,
    by_tmdb: HashMap<i32, Vec<SearchableItem>>,
    by_tvdb: HashMap<i32, Vec<SearchableItem>>,
}

/// Lowercases and strips everything but alphanumerics, matching the
/// normalization releases need after `parse_release_title` cleans
/// separators the other direction.
pub fn normalize_title(title: &str) -> String {
    title.chars().filter(|c| c.is_alphanumeric()).flat_map(|c| c.to_lowercase()).collect()
}

impl WantedIndex {
    pub fn build(items: &[SearchableItem]) -> Self {
        let mut index = WantedIndex::default();
        for item in items {
            index.by_title.entry(normalize_title(&item.title)).or_default().push(item.clone());
            if let Some(id) = &item.imdb_id {
                index.by_imdb.entry(id.clone()).or_default().push(item.clone());
            }
            if let Some(id) = item.tmdb_id {
                index.by_tmdb.entry(id).or_default().push(item.clone());
            }
            if let Some(id) = item.tvdb_id {
                index.by_tvdb.entry(id).or_default().push(item.clone());
            }
        }
        index
    }

    /// §4.3 step 2: try external ids in order, fall back to title.
    fn candidates(&self, release: &ReleaseInfo, parsed_title: &str) -> Vec<SearchableItem> {
        if let Some(id) = &release.imdb_id {
            if let Some(items) = self.by_imdb.get(id) {
                return items.clone();
            }
        }
        if let Some(id) = release.tmdb_id {
            if let Some(items) = self.by_tmdb.get(&id) {
                return items.clone();
            }
        }
        if let Some(id) = release.tvdb_id {
            if let Some(items) = self.by_tvdb.get(&id) {
                return items.clone();
            }
        }
        self.by_title.get(&normalize_title(parsed_title)).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub release: ReleaseInfo,
    pub wanted_item: SearchableItem,
    pub is_season: bool,
}

fn extract_imdb_from_url(url: &str) -> Option<String> {
    let pos = url.find("tt")?;
    let tail = &url[pos..];
    let digits: String = tail.chars().skip(2).take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 6 {
        Some(format!("tt{digits}"))
    } else {
        None
    }
}

/// §4.3: matches one release against the wanted index.
pub async fn match_release<R: WantedRepository + ?Sized>(
    repo: &R,
    index: &WantedIndex,
    release: &mut ReleaseInfo,
) -> Result<Vec<MatchResult>> {
    let parsed = parse_release_title(&release.title);
    if parsed.title.is_empty() {
        return Ok(Vec::new());
    }

    if release.imdb_id.is_none() {
        if let Some(id) = extract_imdb_from_url(release.info_url.as_deref().unwrap_or("")) {
            release.imdb_id = Some(id);
        }
    }

    let candidates = index.candidates(release, &parsed.title);
    let mut results = Vec::new();

    if parsed.is_season_pack {
        results.extend(season_pack_matches(repo, release, &parsed, &candidates).await?);
    } else if parsed.is_tv {
        for candidate in &candidates {
            if candidate.media_type != MediaType::Episode {
                continue;
            }
            if candidate.season_number == parsed.season && candidate.episode_number == parsed.episode {
                results.push(MatchResult {
                    release: release.clone(),
                    wanted_item: candidate.clone(),
                    is_season: false,
                });
            }
        }
    } else {
        for candidate in &candidates {
            if candidate.media_type != MediaType::Movie {
                continue;
            }
            let matched_by_external_id = (release.imdb_id.is_some() && release.imdb_id == candidate.imdb_id)
                || (release.tmdb_id.is_some() && release.tmdb_id == candidate.tmdb_id);
            if !matched_by_external_id && parsed.year.is_some() && candidate.year.is_some() && parsed.year != candidate.year {
                continue;
            }
            results.push(MatchResult {
                release: release.clone(),
                wanted_item: candidate.clone(),
                is_season: false,
            });
        }
    }

    Ok(results)
}

/// (b) on-the-fly season synthesis checks the true episode roster via
/// `repo.list_episodes_by_season` — not the wanted-only index — since a
/// season with some already-available, non-wanted episodes must NOT be
/// treated as all-missing (§4.1's strict all-or-nothing rationale).
async fn season_pack_matches<R: WantedRepository + ?Sized>(
    repo: &R,
    release: &ReleaseInfo,
    parsed: &ParsedMedia,
    candidates: &[SearchableItem],
) -> Result<Vec<MatchResult>> {
    let season_hits: Vec<&SearchableItem> = candidates
        .iter()
        .filter(|c| c.media_type == MediaType::Season && c.season_number == parsed.season)
        .collect();

    if !season_hits.is_empty() {
        return Ok(season_hits
            .into_iter()
            .map(|c| MatchResult {
                release: release.clone(),
                wanted_item: c.clone(),
                is_season: true,
            })
            .collect());
    }

    // synthesize a season item on the fly from episode candidates sharing
    // that season, deduped per (series_id, season).
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for candidate in candidates {
        if candidate.media_type != MediaType::Episode {
            continue;
        }
        let Some(series_id) = candidate.series_id else { continue };
        let Some(season) = parsed.season else { continue };
        if candidate.season_number != Some(season) {
            continue;
        }
        let key = (series_id, season);
        if !seen.insert(key) {
            continue;
        }

        let season_row = repo.get_season_by_number(series_id, season).await?;
        let season_monitored = season_row.map(|s| s.monitored).unwrap_or(false);
        if !season_monitored {
            continue;
        }

        let roster = repo.list_episodes_by_season(series_id, season).await?;
        if roster.is_empty() {
            continue;
        }

        let all_missing = roster.len() >= 2
            && roster.iter().all(|e| e.monitored)
            && roster.iter().all(|e| e.status == MediaStatus::Missing);
        let monitored: Vec<_> = roster.iter().filter(|e| e.monitored).collect();
        let all_upgradable = monitored.len() >= 2
            && monitored.iter().all(|e| e.status == MediaStatus::Upgradable);
        if !(all_missing || all_upgradable) {
            continue;
        }

        let first = &roster[0];
        let synthesized = SearchableItem {
            media_type: MediaType::Season,
            media_id: series_id,
            title: first.title.clone(),
            year: first.year,
            imdb_id: first.imdb_id.clone(),
            tmdb_id: first.tmdb_id,
            tvdb_id: first.tvdb_id,
            series_id: Some(series_id),
            season_number: Some(season),
            episode_number: None,
            quality_profile_id: first.quality_profile_id,
            has_file: all_upgradable,
            current_quality_id: roster.iter().filter_map(|e| e.current_quality_id).max(),
            target_slot_id: first.target_slot_id,
        };
        out.push(MatchResult {
            release: release.clone(),
            wanted_item: synthesized,
            is_season: true,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_titles_for_lookup() {
        assert_eq!(normalize_title("Dune: Part Two (2024)"), "duneparttwo2024");
    }

    #[test]
    fn extracts_imdb_id_from_info_url() {
        assert_eq!(
            extract_imdb_from_url("https://example.com/details/tt1234567/"),
            Some("tt1234567".to_string())
        );
        assert_eq!(extract_imdb_from_url("https://example.com/details/"), None);
    }
}
