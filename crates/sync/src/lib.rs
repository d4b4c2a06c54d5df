//! The sync crate: RSS ingestion, wanted-item collection, release
//! matching/scoring/selection, and grab execution (§4.1, §4.3–§4.8).
//!
//! Grounded in `core::services::rss_service.rs`'s cycle shape, split
//! into focused modules so each piece (`wanted`, `matcher`, `scorer`,
//! `grab`, `rss_fetcher`) is independently testable without a live
//! repository.

pub mod autosearch;
pub mod feed_source;
pub mod grab;
pub mod grab_lock;
pub mod matcher;
pub mod orchestrator;
pub mod profiles;
pub mod rss_fetcher;
pub mod scorer;
pub mod wanted;

pub use autosearch::{collect_targeted_matches, RecentGrabBackoff};
pub use feed_source::ClientFeedSource;
pub use grab::{execute_grab, GrabOutcome, GrabRequest};
pub use grab_lock::{GrabLock, GrabLockGuard};
pub use matcher::{match_release, MatchResult, WantedIndex};
pub use orchestrator::{score_and_grab, GrabSummary, RssSyncOrchestrator, SyncRepo};
pub use profiles::QualityProfileStore;
pub use rss_fetcher::{Feed, FeedSource, RssFetcher};
pub use scorer::{DefaultScorer, ReleaseScorer, ScoreContext};
pub use wanted::{collect_wanted, BackoffChecker, NoBackoff, SearchType};
