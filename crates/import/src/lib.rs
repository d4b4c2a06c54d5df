//! Import trigger port.
//!
//! The teacher's full import pipeline (file scanning, quality
//! re-analysis, hardlinking, rename templates) has no counterpart here:
//! once a download completes, what happens to the files on disk is out
//! of scope. What remains is the boundary the rest of the workspace
//! needs regardless — a place to call, and an event to publish, when
//! the queue broadcaster (`crates/downloaders`) notices a download is
//! done and the catalog needs to move on.

use std::sync::Arc;

use async_trait::async_trait;
use radarr_core::events::{EventBus, SystemEvent};
use radarr_core::Result;
use tracing::info;
use uuid::Uuid;

/// Notified once per completed download, per §4.7.3/§4.7.6 ("triggering
/// import"). Implementations decide what "import" means downstream;
/// this crate only owns the notification boundary.
#[async_trait]
pub trait ImportTrigger: Send + Sync {
    async fn notify_completed(
        &self,
        movie_id: Option<Uuid>,
        series_id: Option<Uuid>,
        episode_id: Option<Uuid>,
        download_path: &str,
    ) -> Result<()>;
}

/// Publishes the completion onto the shared event bus (§6's WebSocket
/// event shapes, carried by `core::events` regardless of whether an
/// HTTP/websocket transport is attached). Movies have a dedicated
/// `ImportTriggered` event; series/episode completions are logged until
/// a TV-specific event variant exists.
pub struct EventBusImportTrigger {
    event_bus: Arc<EventBus>,
}

impl EventBusImportTrigger {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl ImportTrigger for EventBusImportTrigger {
    async fn notify_completed(
        &self,
        movie_id: Option<Uuid>,
        series_id: Option<Uuid>,
        episode_id: Option<Uuid>,
        download_path: &str,
    ) -> Result<()> {
        if let Some(movie_id) = movie_id {
            self.event_bus
                .publish(SystemEvent::ImportTriggered { movie_id, source_path: download_path.to_string() })
                .await?;
        } else {
            info!(
                series_id = ?series_id,
                episode_id = ?episode_id,
                path = download_path,
                "import triggered for episode"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notifies_movie_completion_over_the_event_bus() {
        let event_bus = Arc::new(EventBus::new());
        let mut rx = event_bus.subscribe();
        let trigger = EventBusImportTrigger::new(event_bus);

        let movie_id = Uuid::new_v4();
        trigger.notify_completed(Some(movie_id), None, None, "/downloads/movie.mkv").await.unwrap();

        let envelope = rx.recv().await.unwrap();
        match envelope.event {
            SystemEvent::ImportTriggered { movie_id: id, source_path } => {
                assert_eq!(id, movie_id);
                assert_eq!(source_path, "/downloads/movie.mkv");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn episode_completion_does_not_error_without_a_dedicated_event() {
        let event_bus = Arc::new(EventBus::new());
        let trigger = EventBusImportTrigger::new(event_bus);

        let result = trigger
            .notify_completed(None, Some(Uuid::new_v4()), Some(Uuid::new_v4()), "/downloads/episode.mkv")
            .await;
        assert!(result.is_ok());
    }
}
