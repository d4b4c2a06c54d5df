//! NZBGet is a recognized `ClientType` but has no driver: every operation
//! returns `RadarrError::NotImplemented`, matching §6's explicit "not
//! implemented" note for this client rather than silently misrouting
//! usenet grabs to a client that doesn't exist.

use async_trait::async_trait;
use radarr_core::models::DownloadItem;
use radarr_core::{RadarrError, Result};

use crate::client::{AddOptions, ClientType, DownloadClient, Protocol};

pub struct NzbgetClient;

fn unimplemented(capability: &str) -> RadarrError {
    RadarrError::NotImplemented {
        client: "nzbget".to_string(),
        capability: capability.to_string(),
    }
}

#[async_trait]
impl DownloadClient for NzbgetClient {
    fn client_type(&self) -> ClientType {
        ClientType::Nzbget
    }

    fn protocol(&self) -> Protocol {
        Protocol::Usenet
    }

    async fn test(&self) -> Result<()> {
        Err(unimplemented("test"))
    }

    async fn connect(&self) -> Result<()> {
        Err(unimplemented("connect"))
    }

    async fn add(&self, _opts: &AddOptions<'_>) -> Result<String> {
        Err(unimplemented("add"))
    }

    async fn list(&self) -> Result<Vec<DownloadItem>> {
        Err(unimplemented("list"))
    }

    async fn get(&self, _id: &str) -> Result<DownloadItem> {
        Err(unimplemented("get"))
    }

    async fn remove(&self, _id: &str, _delete_files: bool) -> Result<()> {
        Err(unimplemented("remove"))
    }

    async fn pause(&self, _id: &str) -> Result<()> {
        Err(unimplemented("pause"))
    }

    async fn resume(&self, _id: &str) -> Result<()> {
        Err(unimplemented("resume"))
    }

    async fn get_download_dir(&self) -> Result<String> {
        Err(unimplemented("get_download_dir"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_operation_is_not_implemented() {
        let client = NzbgetClient;
        assert!(matches!(
            client.test().await,
            Err(RadarrError::NotImplemented { .. })
        ));
        assert!(matches!(
            client.list().await,
            Err(RadarrError::NotImplemented { .. })
        ));
    }
}
