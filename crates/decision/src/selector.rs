//! `SelectBestRelease` (§4.2) — pure selection over presorted releases.
//!
//! No I/O, no DB; grounded in the teacher's `DecisionEngine::select_best_release`
//! shape (iterate presorted candidates, return the first passing one) but
//! with the spec's TV-target-match + quality-acceptability + upgrade-gate
//! pipeline instead of the teacher's size/seeder/age hard constraints.

use crate::parsed_media::{parse_release_title, ParsedMedia};
use crate::quality::QualityProfile;
use radarr_core::models::{MediaType, ReleaseInfo, SearchableItem};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    NoTargetMatch,
    QualityUnacceptable,
    NoFileUnknownCurrentQuality,
    UnknownCandidateQuality,
    NotAnUpgrade,
}

/// `SelectBestRelease(releases, profile, item)`. `releases` must already
/// be sorted by score descending (§4.2 precondition, enforced by the
/// RSS-sync/autosearch caller, not here).
pub fn select_best_release(
    releases: &[ReleaseInfo],
    profile: &QualityProfile,
    item: &SearchableItem,
) -> Option<ReleaseInfo> {
    let mut rejections: Vec<(String, RejectionReason)> = Vec::new();
    let mut any_season_pack = false;
    let mut any_season_match = false;

    for release in releases {
        let parsed = parse_release_title(&release.title);

        if matches!(item.media_type, MediaType::Episode | MediaType::Season) {
            if parsed.is_season_pack {
                any_season_pack = true;
            }
            match target_match(item, &parsed) {
                TargetMatch::Reject => {
                    if rejections.len() < 5 {
                        rejections.push((release.title.clone(), RejectionReason::NoTargetMatch));
                    }
                    continue;
                }
                TargetMatch::SeasonMatched => any_season_match = true,
                TargetMatch::Accept => {}
            }
        }

        let release_quality_id = release.score_breakdown.quality_id;

        if release_quality_id > 0 && !profile.is_acceptable(release_quality_id) {
            if rejections.len() < 5 {
                rejections.push((release.title.clone(), RejectionReason::QualityUnacceptable));
            }
            continue;
        }

        if item.has_file {
            let current = match item.current_quality_id {
                Some(q) if q > 0 => q,
                _ => {
                    if rejections.len() < 5 {
                        rejections.push((release.title.clone(), RejectionReason::NoFileUnknownCurrentQuality));
                    }
                    continue;
                }
            };
            if release_quality_id == 0 {
                if rejections.len() < 5 {
                    rejections.push((release.title.clone(), RejectionReason::UnknownCandidateQuality));
                }
                continue;
            }
            if !profile.is_upgrade(current, release_quality_id) {
                if rejections.len() < 5 {
                    rejections.push((release.title.clone(), RejectionReason::NotAnUpgrade));
                }
                continue;
            }
        }

        debug!(title = %release.title, item_key = %item.item_key(), "selected release");
        return Some(release.clone());
    }

    if item.media_type == MediaType::Season {
        if any_season_pack && !any_season_match {
            info!(item_key = %item.item_key(), "no season match at all among feed releases");
        } else if any_season_match {
            info!(item_key = %item.item_key(), "no season pack among matches");
        }
    }
    for (title, reason) in &rejections {
        debug!(title = %title, ?reason, "release rejected");
    }
    None
}

enum TargetMatch {
    Accept,
    SeasonMatched,
    Reject,
}

fn target_match(item: &SearchableItem, parsed: &ParsedMedia) -> TargetMatch {
    match item.media_type {
        MediaType::Season => {
            let Some(item_season) = item.season_number else {
                return TargetMatch::Reject;
            };
            if item_season > 0 {
                let matched = if let (true, Some(end)) = (parsed.is_complete_series, parsed.end_season) {
                    end > 0 && (parsed.season.unwrap_or(0)..=end).contains(&item_season)
                } else {
                    parsed.season == Some(item_season)
                };
                if matched && parsed.is_season_pack {
                    TargetMatch::SeasonMatched
                } else {
                    TargetMatch::Reject
                }
            } else {
                TargetMatch::Reject
            }
        }
        MediaType::Episode => {
            let Some(item_episode) = item.episode_number else {
                return TargetMatch::Reject;
            };
            if parsed.episode == Some(item_episode)
                && item
                    .season_number
                    .map(|s| parsed.season == Some(s))
                    .unwrap_or(true)
            {
                TargetMatch::Accept
            } else {
                TargetMatch::Reject
            }
        }
        _ => TargetMatch::Accept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use radarr_core::models::{MediaType, ReleaseInfo, ScoreBreakdown, SearchableItem};
    use uuid::Uuid;

    fn release(title: &str, quality_id: i32, score: i32) -> ReleaseInfo {
        ReleaseInfo {
            title: title.to_string(),
            download_url: format!("https://example/{title}"),
            guid: title.to_string(),
            info_url: None,
            indexer_id: 1,
            indexer_name: "test".to_string(),
            publish_date: Utc::now(),
            source: None,
            resolution: None,
            imdb_id: None,
            tmdb_id: Some(693134),
            tvdb_id: None,
            info_hash: None,
            seeders: Some(50),
            leechers: Some(1),
            size_bytes: Some(10_000_000_000),
            score,
            score_breakdown: ScoreBreakdown {
                quality_id,
                quality_name: String::new(),
                components: Default::default(),
            },
        }
    }

    fn movie_item(has_file: bool, current_quality_id: Option<i32>) -> SearchableItem {
        SearchableItem {
            media_type: MediaType::Movie,
            media_id: Uuid::new_v4(),
            title: "Dune Part Two".to_string(),
            year: Some(2024),
            imdb_id: None,
            tmdb_id: Some(693134),
            tvdb_id: None,
            series_id: None,
            season_number: None,
            episode_number: None,
            quality_profile_id: Uuid::new_v4(),
            has_file,
            current_quality_id,
            target_slot_id: None,
        }
    }

    #[test]
    fn returns_none_for_empty_list() {
        let profile = QualityProfile::default();
        let item = movie_item(false, None);
        assert!(select_best_release(&[], &profile, &item).is_none());
    }

    #[test]
    fn scenario_1_mixed_candidates_picks_1080p_bluray_not_2160p() {
        let profile = QualityProfile::default();
        let item = movie_item(false, None);
        let releases = vec![
            release("Dune.Part.Two.2024.2160p.UHD.BluRay", 19, 100),
            release("Dune.Part.Two.2024.1080p.BluRay", 11, 90),
            release("Dune.Part.Two.2024.1080p.WEB-DL", 8, 70),
            release("Dune.Part.Two.2024.720p.WEB-DL", 5, 50),
        ];
        // Simulate the UHD-disallowing HD-1080p profile from the scenario.
        let mut profile = profile;
        for d in profile.definitions.iter_mut() {
            if d.quality == crate::quality::Quality::UHD4K {
                d.allowed = false;
            }
        }
        let selected = select_best_release(&releases, &profile, &item).unwrap();
        assert_eq!(selected.score_breakdown.quality_id, 11);
    }

    #[test]
    fn scenario_2_balanced_strategy_blocks_upgrade() {
        let profile = QualityProfile::default();
        let item = movie_item(true, Some(5)); // WEBDL-720p on disk
        let releases = vec![
            release("Inception.720p.WEB-DL", 5, 50),
            release("Inception.720p.WEBRip", 6, 48),
        ];
        assert!(select_best_release(&releases, &profile, &item).is_none());
    }

    #[test]
    fn never_returns_non_season_pack_for_season_item() {
        let profile = QualityProfile::default();
        let item = SearchableItem {
            season_number: Some(3),
            episode_number: None,
            media_type: MediaType::Season,
            series_id: Some(Uuid::new_v4()),
            ..movie_item(false, None)
        };
        let releases = vec![release("Breaking.Bad.S03E07.1080p.WEB-DL", 8, 90)];
        assert!(select_best_release(&releases, &profile, &item).is_none());
    }
}
