//! `FeedSource` over the aggregated `IndexerClient` (§4.4): rather than
//! a dedicated per-protocol wire client per indexer, native indexers are
//! fetched through the same Prowlarr-backed client as the synthetic
//! aggregated feed, scoped to one indexer via `indexer_ids`.
//!
//! Grounded in `autosearch.rs`'s `collect_targeted_matches`, which
//! drives the same `IndexerClient::search` + `from_prowlarr_result`
//! pair for a different (per-item rather than per-feed) query shape.

use std::sync::Arc;

use async_trait::async_trait;
use radarr_core::models::{Indexer, ReleaseInfo};
use radarr_core::Result;
use radarr_indexers::{IndexerClient, SearchRequest};

use crate::rss_fetcher::{from_prowlarr_result, FeedSource, MAX_RESULTS_PER_INDEXER};

/// Queries `indexer_client` for the latest releases on one indexer, with
/// no search terms (the RSS-equivalent "recent releases" query).
pub struct ClientFeedSource {
    client: Arc<dyn IndexerClient + Send + Sync>,
}

impl ClientFeedSource {
    pub fn new(client: Arc<dyn IndexerClient + Send + Sync>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for ClientFeedSource {
    async fn fetch_feed(&self, indexer: &Indexer) -> Result<Vec<ReleaseInfo>> {
        let request = SearchRequest {
            indexer_ids: vec![indexer.id],
            limit: Some(MAX_RESULTS_PER_INDEXER as i32),
            ..Default::default()
        };
        let response = self.client.search(&request).await?;
        Ok(response.results.into_iter().map(from_prowlarr_result).collect())
    }
}
