//! RSS feed fetcher (§4.4) — per-indexer fetch with in-memory consecutive-
//! failure backoff, plus the Prowlarr-aggregated dual mode.
//!
//! Grounded in `crates/indexers/src/multi_indexer.rs`'s parallel
//! per-indexer fetch with per-indexer error isolation, and in
//! `core::circuit_breaker.rs` for the counter-threshold-trip shape
//! (simpler here: no half-open/cooldown, just a sticky counter reset on
//! any success, per §4.4's literal "in-memory... resets on process
//! restart or explicit reset").

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use radarr_core::domain::repositories::IndexerRssRepository;
use radarr_core::models::{Indexer, IndexerImplementation, ReleaseInfo, ScoreBreakdown};
use radarr_core::Result;
use radarr_indexers::{IndexerClient, SearchRequest};
use tracing::warn;

pub const MAX_RESULTS_PER_INDEXER: usize = 1000;
pub const RSS_BACKOFF_THRESHOLD: u32 = 3;

/// One indexer's fetch outcome for a cycle.
#[derive(Debug, Clone)]
pub struct Feed {
    pub indexer_id: i32,
    pub indexer_name: String,
    pub releases: Vec<ReleaseInfo>,
    pub error: Option<String>,
}

/// Per-indexer wire fetch, hidden behind a trait so native torznab/newznab
/// dialects can be added without touching the fetcher's backoff/dedup
/// logic. A production deployment implements this per `IndexerImplementation`.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, indexer: &Indexer) -> Result<Vec<ReleaseInfo>>;
}

pub struct RssFetcher<F: FeedSource> {
    source: F,
    failure_counts: Mutex<HashMap<i32, u32>>,
}

impl<F: FeedSource> RssFetcher<F> {
    pub fn new(source: F) -> Self {
        Self { source, failure_counts: Mutex::new(HashMap::new()) }
    }

    pub fn reset_backoff(&self, indexer_id: i32) {
        self.failure_counts.lock().unwrap().remove(&indexer_id);
    }

    /// Fetches every RSS-enabled native indexer (anything not itself the
    /// Prowlarr aggregator), honoring per-indexer backoff.
    pub async fn fetch_native<R: IndexerRssRepository + ?Sized>(&self, repo: &R) -> Result<Vec<Feed>> {
        let indexers = repo.list_rss_enabled_indexers().await?;
        let mut feeds = Vec::new();
        for indexer in indexers.iter().filter(|i| i.implementation != IndexerImplementation::Prowlarr) {
            feeds.push(self.fetch_one(indexer).await);
        }
        Ok(feeds)
    }

    async fn fetch_one(&self, indexer: &Indexer) -> Feed {
        let failure_count = *self.failure_counts.lock().unwrap().get(&indexer.id).unwrap_or(&0);
        if failure_count >= RSS_BACKOFF_THRESHOLD {
            return Feed {
                indexer_id: indexer.id,
                indexer_name: indexer.name.clone(),
                releases: Vec::new(),
                error: Some(format!("backed off after {failure_count} consecutive failures")),
            };
        }

        match self.source.fetch_feed(indexer).await {
            Ok(releases) => {
                self.failure_counts.lock().unwrap().remove(&indexer.id);
                Feed { indexer_id: indexer.id, indexer_name: indexer.name.clone(), releases, error: None }
            }
            Err(e) => {
                let mut counts = self.failure_counts.lock().unwrap();
                let count = counts.entry(indexer.id).or_insert(0);
                *count += 1;
                warn!(indexer = %indexer.name, error = %e, consecutive_failures = *count, "RSS fetch failed");
                Feed {
                    indexer_id: indexer.id,
                    indexer_name: indexer.name.clone(),
                    releases: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

const PROWLARR_SYNTHETIC_INDEXER_ID: i32 = 0;
const MOVIE_CATEGORY: i32 = 2000;
const TV_CATEGORY: i32 = 5000;

/// §4.4 Prowlarr-aggregated mode: two calls (movie, tvsearch) merged and
/// deduped into one synthetic `indexerID = 0` feed.
pub async fn fetch_prowlarr_aggregated(client: &dyn IndexerClient) -> Feed {
    let movie_req = SearchRequest { categories: vec![MOVIE_CATEGORY], limit: Some(MAX_RESULTS_PER_INDEXER as i32), ..Default::default() };
    let tv_req = SearchRequest { categories: vec![TV_CATEGORY], limit: Some(MAX_RESULTS_PER_INDEXER as i32), ..Default::default() };

    let mut releases = Vec::new();
    let mut error = None;

    for req in [movie_req, tv_req] {
        match client.search(&req).await {
            Ok(response) => releases.extend(response.results.into_iter().map(from_prowlarr_result)),
            Err(e) => error = Some(e.to_string()),
        }
    }

    let mut seen = HashSet::new();
    releases.retain(|r: &ReleaseInfo| seen.insert(r.download_url.clone()));

    Feed {
        indexer_id: PROWLARR_SYNTHETIC_INDEXER_ID,
        indexer_name: "prowlarr-aggregated".to_string(),
        releases,
        error,
    }
}

pub(crate) fn from_prowlarr_result(r: radarr_indexers::ProwlarrSearchResult) -> ReleaseInfo {
    ReleaseInfo {
        title: r.title,
        guid: r.download_url.clone(),
        download_url: r.download_url,
        info_url: r.info_url,
        indexer_id: r.indexer_id,
        indexer_name: r.indexer,
        publish_date: r.publish_date.unwrap_or_else(chrono::Utc::now),
        source: None,
        resolution: None,
        imdb_id: r.imdb_id,
        tmdb_id: r.tmdb_id,
        tvdb_id: None,
        info_hash: None,
        seeders: r.seeders,
        leechers: r.leechers,
        size_bytes: r.size,
        score: 0,
        score_breakdown: ScoreBreakdown::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakySource {
        fail_times: AtomicU32,
    }

    #[async_trait]
    impl FeedSource for FlakySource {
        async fn fetch_feed(&self, _indexer: &Indexer) -> Result<Vec<ReleaseInfo>> {
            if self.fail_times.fetch_sub(1, Ordering::SeqCst) > 0 {
                Err(radarr_core::RadarrError::FeedFetchError { indexer: "test".into(), message: "boom".into() })
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn indexer(id: i32) -> Indexer {
        let mut idx = Indexer::new("test".to_string(), IndexerImplementation::Torznab);
        idx.id = id;
        idx
    }

    #[tokio::test]
    async fn trips_backoff_after_threshold_consecutive_failures() {
        let fetcher = RssFetcher::new(FlakySource { fail_times: AtomicU32::new(10) });
        let idx = indexer(1);
        for _ in 0..RSS_BACKOFF_THRESHOLD {
            let feed = fetcher.fetch_one(&idx).await;
            assert!(feed.error.is_some());
        }
        let feed = fetcher.fetch_one(&idx).await;
        assert!(feed.error.unwrap().contains("backed off"));
    }

    #[tokio::test]
    async fn success_clears_failure_counter() {
        let fetcher = RssFetcher::new(FlakySource { fail_times: AtomicU32::new(1) });
        let idx = indexer(2);
        let _ = fetcher.fetch_one(&idx).await; // fails once
        let feed = fetcher.fetch_one(&idx).await; // succeeds, clears counter
        assert!(feed.error.is_none());
        assert_eq!(*fetcher.failure_counts.lock().unwrap().get(&2).unwrap_or(&0), 0);
    }
}
