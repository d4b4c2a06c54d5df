//! Radarr downloaders module
//!
//! This crate provides integrations with various download clients
//! used for downloading torrents and managing the download queue.

pub mod client;
pub mod factory;
pub mod qbittorrent;

pub mod deluge;
pub mod mock;
pub mod nzbget;
pub mod queue_broadcaster;
pub mod sabnzbd;
pub mod service;
pub mod thin;
pub mod thin2;
pub mod transmission;

#[cfg(test)]
mod tests;

// Re-export public types
pub use client::{AddOptions, ClientType, DownloadClient, Protocol, TorrentClient, UsenetClient};
pub use factory::build_client;
pub use qbittorrent::{
    AddTorrentParams, AppPreferences, QBittorrentClient, QBittorrentConfig, TorrentData,
    TorrentInfo,
};
pub use queue_broadcaster::QueueBroadcaster;
pub use service::{ClientError, CompletedDownload, DownloaderService, QueueItem, QueueSnapshot};
