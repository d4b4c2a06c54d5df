//! Shared indexer-row parsing helper, reused by `indexer_rss.rs`'s
//! enabled-indexer query. The teacher's full `IndexerRepository` CRUD
//! impl had no counterpart once `PostgresAcquisitionRepository`'s
//! `IndexerRssRepository` impl took over reading the `indexers` table.

use radarr_core::{models::IndexerImplementation, Result};

pub(crate) fn parse_indexer_implementation(implementation_str: &str) -> Result<IndexerImplementation> {
    match implementation_str {
        "prowlarr" => Ok(IndexerImplementation::Prowlarr),
        "jackett" => Ok(IndexerImplementation::Jackett),
        "torznab" => Ok(IndexerImplementation::Torznab),
        "newznab" => Ok(IndexerImplementation::Newznab),
        _ => Err(radarr_core::RadarrError::ValidationError {
            field: "implementation".to_string(),
            message: format!("Invalid indexer implementation: {}", implementation_str),
        }),
    }
}
