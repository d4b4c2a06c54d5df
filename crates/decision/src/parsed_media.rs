//! `ParsedMedia` — the result of parsing a release title (§3).
//!
//! §1 treats filename parsing itself as an external collaborator; this
//! module defines the data shape the Matcher/Selector consume and a
//! concrete reference parser so the pipeline is exercisable end to end
//! in tests. A production deployment may swap in a richer parser behind
//! the same `parse_release_title` signature without touching the
//! Matcher/Selector.

use crate::quality::{Quality, Source};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedMedia {
    pub title: String,
    pub year: Option<i32>,
    pub season: Option<i32>,
    pub end_season: Option<i32>,
    pub episode: Option<i32>,
    pub is_season_pack: bool,
    pub is_complete_series: bool,
    pub is_tv: bool,
    pub quality: Quality,
    pub source: Source,
    pub codec: Option<String>,
    pub resolution: Option<String>,
    pub attributes: Vec<String>,
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Unknown
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Unknown
    }
}

/// Parse a release title into `ParsedMedia`. Grounded in the teacher's
/// `Quality::from_resolution`/`Source::from_release_name` classification,
/// extended with season/episode/pack detection using the scene-naming
/// conventions already implied by `multi_indexer.rs`'s title handling.
pub fn parse_release_title(title: &str) -> ParsedMedia {
    let resolution = extract_resolution(title);
    let quality = resolution
        .as_deref()
        .map(Quality::from_resolution)
        .unwrap_or(Quality::Unknown);
    let source = Source::from_release_name(title);
    let codec = extract_codec(title);
    let year = extract_year(title);

    let (season, end_season, episode, is_season_pack, is_complete_series, is_tv) =
        parse_season_episode(title);

    let clean_title = clean_title(title, year, season, episode);

    ParsedMedia {
        title: clean_title,
        year,
        season,
        end_season,
        episode,
        is_season_pack,
        is_complete_series,
        is_tv,
        quality,
        source,
        codec,
        resolution,
        attributes: extract_attributes(title),
    }
}

fn extract_resolution(title: &str) -> Option<String> {
    for token in ["2160p", "1080p", "720p", "480p", "4K", "4k"] {
        if title.contains(token) {
            return Some(token.to_string());
        }
    }
    None
}

fn extract_codec(title: &str) -> Option<String> {
    let lower = title.to_lowercase();
    for (needle, name) in [
        ("x265", "x265"),
        ("h265", "x265"),
        ("hevc", "x265"),
        ("x264", "x264"),
        ("h264", "x264"),
        ("av1", "AV1"),
    ] {
        if lower.contains(needle) {
            return Some(name.to_string());
        }
    }
    None
}

fn extract_year(title: &str) -> Option<i32> {
    let bytes = title.as_bytes();
    let mut i = 0;
    while i + 4 <= bytes.len() {
        let candidate = &title[i..i + 4];
        if candidate.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(year) = candidate.parse::<i32>() {
                if (1900..=2100).contains(&year) {
                    return Some(year);
                }
            }
        }
        i += 1;
    }
    None
}

/// Recognizes `S03E07`, `S03`, `S01-S03` (complete series range) and
/// "Complete Series" markers. Case-insensitive.
fn parse_season_episode(title: &str) -> (Option<i32>, Option<i32>, Option<i32>, bool, bool, bool) {
    let upper = title.to_uppercase();

    if upper.contains("COMPLETE SERIES") || upper.contains("COMPLETE.SERIES") {
        return (Some(1), None, None, true, true, true);
    }

    let re = regex::Regex::new(r"S(\d{1,2})E(\d{1,3})").unwrap();
    if let Some(cap) = re.captures(&upper) {
        let season = cap.get(1).and_then(|m| m.as_str().parse::<i32>().ok());
        let episode = cap.get(2).and_then(|m| m.as_str().parse::<i32>().ok());
        return (season, None, episode, false, false, true);
    }

    // Season range pack, e.g. S01-S03
    let range_re = regex::Regex::new(r"S(\d{1,2})-S?(\d{1,2})").unwrap();
    if let Some(cap) = range_re.captures(&upper) {
        let start = cap.get(1).and_then(|m| m.as_str().parse::<i32>().ok());
        let end = cap.get(2).and_then(|m| m.as_str().parse::<i32>().ok());
        return (start, end, None, true, false, true);
    }

    // Single season pack, e.g. S03 with no episode marker.
    let season_re = regex::Regex::new(r"S(\d{1,2})(?:\b|\.|\s)").unwrap();
    if let Some(cap) = season_re.captures(&upper) {
        let season = cap.get(1).and_then(|m| m.as_str().parse::<i32>().ok());
        return (season, None, None, true, false, true);
    }

    (None, None, None, false, false, false)
}

fn clean_title(title: &str, year: Option<i32>, season: Option<i32>, episode: Option<i32>) -> String {
    let mut cut = title.len();
    if let Some(y) = year {
        if let Some(pos) = title.find(&y.to_string()) {
            cut = cut.min(pos);
        }
    }
    if season.is_some() || episode.is_some() {
        let upper = title.to_uppercase();
        if let Some(pos) = upper.find('S').filter(|&p| {
            upper[p..].chars().nth(1).map(|c| c.is_ascii_digit()).unwrap_or(false)
        }) {
            cut = cut.min(pos);
        }
    }
    title[..cut]
        .trim_matches(|c: char| c == '.' || c == '-' || c.is_whitespace())
        .replace('.', " ")
        .trim()
        .to_string()
}

fn extract_attributes(title: &str) -> Vec<String> {
    let lower = title.to_lowercase();
    let mut attrs = Vec::new();
    for (needle, name) in [
        ("hdr", "HDR"),
        ("dv", "DV"),
        ("atmos", "Atmos"),
        ("proper", "PROPER"),
        ("repack", "REPACK"),
        ("internal", "INTERNAL"),
    ] {
        if lower.contains(needle) {
            attrs.push(name.to_string());
        }
    }
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_movie() {
        let parsed = parse_release_title("Dune.Part.Two.2024.1080p.BluRay.x264");
        assert_eq!(parsed.title, "Dune Part Two");
        assert_eq!(parsed.year, Some(2024));
        assert!(!parsed.is_tv);
        assert_eq!(parsed.quality, Quality::HD1080p);
        assert_eq!(parsed.source, Source::BluRay);
    }

    #[test]
    fn test_parse_episode() {
        let parsed = parse_release_title("Breaking.Bad.S03E07.1080p.WEB-DL.x264");
        assert!(parsed.is_tv);
        assert!(!parsed.is_season_pack);
        assert_eq!(parsed.season, Some(3));
        assert_eq!(parsed.episode, Some(7));
    }

    #[test]
    fn test_parse_season_pack() {
        let parsed = parse_release_title("Breaking.Bad.S03.1080p.BluRay.x264");
        assert!(parsed.is_tv);
        assert!(parsed.is_season_pack);
        assert_eq!(parsed.season, Some(3));
        assert_eq!(parsed.episode, None);
    }

    #[test]
    fn test_parse_complete_series() {
        let parsed = parse_release_title("Breaking.Bad.Complete.Series.1080p.BluRay.x264");
        assert!(parsed.is_complete_series);
        assert!(parsed.is_season_pack);
    }
}
