//! Repository implementations
//!
//! This module contains PostgreSQL implementations of all repository traits
//! defined in the core domain layer.

pub mod blocklist;
pub mod download_client;
pub mod grab_history;
pub mod indexer;
pub mod indexer_rss;
pub mod quality_profile_store;
pub mod settings;
pub mod wanted;

// Re-export all repository implementations
pub use quality_profile_store::PostgresQualityProfileStore;
pub use settings::PostgresSettingsRepository;
// `PostgresAcquisitionRepository` implements WantedRepository (wanted.rs),
// DownloadClientRepository (download_client.rs), IndexerRssRepository
// (indexer_rss.rs) and GrabHistoryRepository (grab_history.rs) all on one
// struct, since `radarr_sync::SyncRepo` needs a single type satisfying
// all four bounds at once.
pub use wanted::PostgresAcquisitionRepository;
pub use blocklist::PostgresBlocklistRepository;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_struct_creation() {
        // This is a basic test to ensure the repository structs can be created
        // In a real test, we would need a database connection pool
        let _acquisition_repo_type = std::marker::PhantomData::<PostgresAcquisitionRepository>;
        let _settings_repo_type = std::marker::PhantomData::<PostgresSettingsRepository>;

        fn assert_sync_repo<T: radarr_sync::SyncRepo>() {}
        assert_sync_repo::<PostgresAcquisitionRepository>();
    }
}
