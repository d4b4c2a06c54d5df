//! Core error types for Radarr domain

use thiserror::Error;

#[cfg(feature = "postgres")]
use sqlx;

#[derive(Error, Debug)]
pub enum RadarrError {
    #[error("Movie not found: {id}")]
    MovieNotFound { id: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid quality profile: {profile}")]
    InvalidQualityProfile { profile: String },

    #[error("Indexer error: {message}")]
    IndexerError { message: String },

    #[error("Domain validation error: {field} - {message}")]
    ValidationError { field: String, message: String },

    #[error("External service error: {service} - {error}")]
    ExternalServiceError { service: String, error: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },

    #[error("Import error: {operation} - {message}")]
    ImportError { operation: String, message: String },

    #[error("File system error: {path} - {error}")]
    FileSystemError { path: String, error: String },

    #[error("Configuration error: {field} - {message}")]
    ConfigurationError { field: String, message: String },

    /// Download client configured with an unknown id.
    #[error("Download client not found: {id}")]
    ClientNotFound { id: String },

    /// Download client configuration fails validation.
    #[error("Invalid download client configuration: {client} - {message}")]
    InvalidClient { client: String, message: String },

    /// Requested client type has no registered driver.
    #[error("Unsupported download client type: {client_type}")]
    UnsupportedClient { client_type: String },

    /// Driver-level authentication failure, after the reauth-once retry
    /// already failed a second time.
    #[error("Authentication failed for client {client}: {message}")]
    AuthFailed { client: String, message: String },

    /// Capability not implemented by a given driver (e.g. nzbget).
    #[error("{capability} not implemented by client {client}")]
    NotImplemented { client: String, capability: String },

    /// Per-indexer RSS/feed fetch failure. Never cycle-fatal.
    #[error("Feed fetch failed for indexer {indexer}: {message}")]
    FeedFetchError { indexer: String, message: String },

    /// Grab (driver call or mapping write) failed for one group.
    #[error("Grab failed for {media_key}: {message}")]
    GrabFailure { media_key: String, message: String },

    /// Unrecoverable repository error; aborts the enclosing cycle.
    #[error("Repository error: {message}")]
    RepositoryError { message: String },
}

pub type Result<T> = std::result::Result<T, RadarrError>;

impl RadarrError {
    /// True for errors that should be treated as transient and local to
    /// one client/feed/group rather than aborting the whole cycle, per
    /// the §7 propagation policy.
    pub fn is_locally_recoverable(&self) -> bool {
        matches!(
            self,
            RadarrError::FeedFetchError { .. }
                | RadarrError::GrabFailure { .. }
                | RadarrError::ExternalServiceError { .. }
                | RadarrError::AuthFailed { .. }
                | RadarrError::ClientNotFound { .. }
        )
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for RadarrError {
    fn from(err: sqlx::Error) -> Self {
        RadarrError::DatabaseError {
            message: err.to_string(),
        }
    }
}
