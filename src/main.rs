//! Radarr acquisition orchestrator - unified application entry point
//!
//! Wires a database pool, indexer client, and download client into the
//! three scheduled tasks (rss-sync, autosearch, queue-broadcast) and
//! runs until a shutdown signal arrives. No HTTP server: the orchestrator
//! is a headless background process.

use radarr_core::{RadarrError, Result};
use radarr_downloaders::QBittorrentClient;
use radarr_indexers::{IndexerClient, ProwlarrClient};
use radarr_infrastructure::{create_pool, DatabaseConfig};
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod services;

use config::AppConfig;
use services::{AppServices, ServiceBuilder};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&AppConfig::from_env()?)?;

    info!("starting radarr acquisition orchestrator");

    let config = load_config().await?;
    info!("configuration loaded");

    run_migrations(&config).await?;
    info!("database migrations completed");

    let mut services = initialize_services(&config).await?;
    info!("all services initialized");

    services.initialize_rss_service().await?;
    services.initialize_autosearch().await?;
    let queue_broadcaster_shutdown = services.initialize_queue_broadcaster();
    services.start_scheduler().await?;
    info!("scheduler started: rss-sync, autosearch, queue-broadcast are running");

    shutdown_signal().await;
    info!("shutdown signal received, stopping queue broadcaster");
    let _ = queue_broadcaster_shutdown.send(());

    info!("radarr acquisition orchestrator shutting down");
    Ok(())
}

/// Initialize tracing, honoring `LoggingConfig`.
fn init_logging(config: &AppConfig) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.logging.json_format {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    }
    .map_err(|e| RadarrError::ExternalServiceError {
        service: "tracing".to_string(),
        error: format!("failed to initialize logging: {}", e),
    })
}

/// Load configuration from environment and validate.
async fn load_config() -> Result<AppConfig> {
    debug!("loading configuration from environment");

    let config = AppConfig::from_env()?;
    config.validate()?;

    debug!(
        "configuration loaded: db_max_conn={}, prowlarr={}, qbittorrent={}",
        config.database.max_connections, config.prowlarr.base_url, config.qbittorrent.base_url
    );

    Ok(config)
}

/// Run database migrations.
async fn run_migrations(config: &AppConfig) -> Result<()> {
    debug!("running database migrations");

    let db_config = DatabaseConfig {
        database_url: config.database.url.clone(),
        max_connections: 1,
        ..DatabaseConfig::default()
    };
    let pool = create_pool(db_config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| RadarrError::ExternalServiceError {
            service: "database_migrations".to_string(),
            error: e.to_string(),
        })?;

    Ok(())
}

/// Build the database pool, indexer client, and download client, then
/// assemble `AppServices` and run startup connectivity checks.
async fn initialize_services(config: &AppConfig) -> Result<AppServices> {
    debug!("initializing application services");

    let db_config = DatabaseConfig {
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    };
    let database_pool = create_pool(db_config).await?;
    info!(
        "database pool created with {} max connections",
        config.database.max_connections
    );

    let prowlarr_config = radarr_indexers::ProwlarrConfig {
        base_url: config.prowlarr.base_url.clone(),
        api_key: config.prowlarr.api_key.clone(),
        timeout: config.prowlarr.timeout,
        max_requests_per_minute: config.prowlarr.max_requests_per_minute,
        user_agent: config.prowlarr.user_agent.clone(),
        verify_ssl: config.prowlarr.verify_ssl,
    };
    let prowlarr_client = Arc::new(ProwlarrClient::new(prowlarr_config).map_err(|e| {
        RadarrError::ExternalServiceError {
            service: "prowlarr".to_string(),
            error: format!("failed to create Prowlarr client: {}", e),
        }
    })?) as Arc<dyn IndexerClient + Send + Sync>;
    info!("Prowlarr client initialized: {}", config.prowlarr.base_url);

    let qbittorrent_config = radarr_downloaders::QBittorrentConfig {
        base_url: config.qbittorrent.base_url.clone(),
        username: config.qbittorrent.username.clone(),
        password: config.qbittorrent.password.clone(),
        timeout: config.qbittorrent.timeout,
    };
    let qbittorrent_client = Arc::new(QBittorrentClient::new(qbittorrent_config).map_err(|e| {
        RadarrError::ExternalServiceError {
            service: "qbittorrent".to_string(),
            error: format!("failed to create qBittorrent client: {}", e),
        }
    })?);
    info!(
        "qBittorrent client initialized: {}",
        config.qbittorrent.base_url
    );

    let services = ServiceBuilder::new()
        .with_database(database_pool)
        .with_prowlarr(prowlarr_client)
        .with_qbittorrent(qbittorrent_client)
        .build()
        .await?;

    services.initialize().await?;
    info!("service connectivity checks passed");

    Ok(services)
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            info!("received SIGTERM, initiating graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.database.max_connections, 10);
    }

    #[tokio::test]
    async fn test_config_loading() {
        std::env::set_var("DATABASE_URL", "sqlite::memory:");

        let config = load_config().await;
        assert!(config.is_ok());

        std::env::remove_var("DATABASE_URL");
    }
}
