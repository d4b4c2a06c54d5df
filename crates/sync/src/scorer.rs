//! External scorer seam (§4.6 step 2). §1 treats the scoring formula
//! itself as an external collaborator; `DefaultScorer` is a concrete
//! reference so the orchestrator is exercisable end to end, grounded in
//! `QualityProfile::score_for`'s quality+source coarse ranking.

use radarr_core::models::{ReleaseInfo, ScoreBreakdown};
use radarr_decision::parsed_media::parse_release_title;
use radarr_decision::quality::QualityProfile;

pub struct ScoreContext {
    pub year: Option<i32>,
    pub season: Option<i32>,
    pub episode: Option<i32>,
}

pub trait ReleaseScorer: Send + Sync {
    fn score(&self, release: &ReleaseInfo, profile: &QualityProfile, context: &ScoreContext) -> (i32, ScoreBreakdown);
}

pub struct DefaultScorer;

impl ReleaseScorer for DefaultScorer {
    fn score(&self, release: &ReleaseInfo, profile: &QualityProfile, _context: &ScoreContext) -> (i32, ScoreBreakdown) {
        let parsed = parse_release_title(&release.title);
        let quality_id = profile
            .definitions
            .iter()
            .find(|d| d.quality == parsed.quality && d.source == parsed.source)
            .map(|d| d.id)
            .unwrap_or(0);
        let score = profile.score_for(&parsed.quality, &parsed.source).max(0);
        let mut components = std::collections::BTreeMap::new();
        components.insert("quality".to_string(), parsed.quality.score());
        components.insert("source".to_string(), parsed.source.score());
        components.insert("seeders".to_string(), release.seeders.unwrap_or(0));
        (
            score + release.seeders.unwrap_or(0).min(50),
            ScoreBreakdown { quality_id, quality_name: profile.quality_name(quality_id), components },
        )
    }
}

/// Scores every release in a group in place and sorts the group by score
/// descending, satisfying `SelectBestRelease`'s presorted precondition.
pub fn score_and_sort(releases: &mut [ReleaseInfo], profile: &QualityProfile, context: &ScoreContext, scorer: &dyn ReleaseScorer) {
    for release in releases.iter_mut() {
        let (score, breakdown) = scorer.score(release, profile, context);
        release.score = score;
        release.score_breakdown = breakdown;
    }
    releases.sort_by(|a, b| b.score.cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn release(title: &str) -> ReleaseInfo {
        ReleaseInfo {
            title: title.to_string(),
            download_url: "https://example/x".to_string(),
            guid: "g".to_string(),
            info_url: None,
            indexer_id: 1,
            indexer_name: "t".to_string(),
            publish_date: Utc::now(),
            source: None,
            resolution: None,
            imdb_id: None,
            tmdb_id: None,
            tvdb_id: None,
            info_hash: None,
            seeders: Some(10),
            leechers: None,
            size_bytes: None,
            score: 0,
            score_breakdown: ScoreBreakdown::default(),
        }
    }

    #[test]
    fn sorts_by_descending_score() {
        let mut releases = vec![release("Movie.720p.WEB-DL"), release("Movie.1080p.BluRay")];
        let profile = QualityProfile::default();
        let ctx = ScoreContext { year: None, season: None, episode: None };
        score_and_sort(&mut releases, &profile, &ctx, &DefaultScorer);
        assert!(releases[0].score >= releases[1].score);
    }
}
