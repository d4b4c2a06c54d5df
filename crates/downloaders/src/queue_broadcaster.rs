//! Queue broadcaster (§4.8): adaptive-cadence loop driving the
//! downloader service's poll/completion/disappearance cycle and
//! publishing `queue:state` over the event bus.
//!
//! Grounded in `core::services::queue_processor::QueueProcessor::start`'s
//! `tokio::select!`-over-interval shape, generalized from a fixed poll
//! period to the spec's active/idle cadence switch plus a non-blocking
//! `Trigger()` signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;


use radarr_core::domain::repositories::DownloadClientRepository;
use radarr_core::events::{EventBus, SystemEvent};
use radarr_core::Result;
use radarr_import::ImportTrigger;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::service::DownloaderService;

const ACTIVE_INTERVAL: Duration = Duration::from_secs(2);
const IDLE_INTERVAL: Duration = Duration::from_secs(30);
const COMPLETION_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Drives one poll/broadcast/completion/disappearance cycle on an
/// adaptive ticker; `Trigger()` forces an immediate cycle and switches
/// the ticker to the active cadence.
pub struct QueueBroadcaster<R: DownloadClientRepository> {
    service: Arc<DownloaderService<R>>,
    event_bus: Arc<EventBus>,
    import_trigger: Arc<dyn ImportTrigger>,
    trigger_tx: mpsc::Sender<()>,
    trigger_rx: tokio::sync::Mutex<mpsc::Receiver<()>>,
    processing_imports: Arc<AtomicBool>,
}

impl<R: DownloadClientRepository + 'static> QueueBroadcaster<R> {
    pub fn new(
        service: Arc<DownloaderService<R>>,
        event_bus: Arc<EventBus>,
        import_trigger: Arc<dyn ImportTrigger>,
    ) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        Self {
            service,
            event_bus,
            import_trigger,
            trigger_tx,
            trigger_rx: tokio::sync::Mutex::new(trigger_rx),
            processing_imports: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Non-blocking signal that forces an immediate broadcast cycle and
    /// switches the ticker to the active cadence. Dropped if a trigger
    /// is already pending.
    pub fn trigger(&self) {
        let _ = self.trigger_tx.try_send(());
    }

    /// Runs the adaptive loop until `shutdown` resolves. Intended to be
    /// spawned as a long-lived task alongside the scheduler.
    pub async fn run(&self, mut shutdown: tokio::sync::oneshot::Receiver<()>) -> Result<()> {
        let mut interval = tokio::time::interval(IDLE_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut current_active = false;
        let mut trigger_rx = self.trigger_rx.lock().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = trigger_rx.recv() => {
                    if !current_active {
                        current_active = true;
                        interval = tokio::time::interval(ACTIVE_INTERVAL);
                        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    }
                }
                _ = &mut shutdown => {
                    info!("queue broadcaster shutting down");
                    return Ok(());
                }
            }

            let has_active = self.run_cycle().await;

            if has_active != current_active {
                current_active = has_active;
                let next = if current_active { ACTIVE_INTERVAL } else { IDLE_INTERVAL };
                interval = tokio::time::interval(next);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            }
        }
    }

    /// One poll → broadcast → completion-check → disappearance-check
    /// cycle. Returns whether the queue currently has downloading/queued
    /// items, which drives the next cadence choice.
    async fn run_cycle(&self) -> bool {
        let snapshot = match self.service.get_queue().await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "queue broadcast cycle failed to poll queue");
                return false;
            }
        };

        let downloading_count = snapshot
            .items
            .iter()
            .filter(|i| matches!(i.download.status, radarr_core::models::DownloadItemStatus::Downloading))
            .count();

        let has_active = snapshot.items.iter().any(|i| {
            matches!(
                i.download.status,
                radarr_core::models::DownloadItemStatus::Downloading
                    | radarr_core::models::DownloadItemStatus::Queued
            )
        });

        if let Err(e) = self
            .event_bus
            .publish(SystemEvent::QueueState {
                item_count: snapshot.items.len(),
                downloading_count,
                errors: snapshot.errors.iter().map(|e| e.message.clone()).collect(),
            })
            .await
        {
            error!(error = %e, "failed to publish queue:state event");
        }

        if self.processing_imports.swap(true, Ordering::SeqCst) {
            // A previous completion handler is still running; skip this
            // cycle's completion/disappearance pass rather than overlap.
            return has_active;
        }

        let service = self.service.clone();
        let processing_imports = self.processing_imports.clone();
        let import_trigger = self.import_trigger.clone();
        tokio::spawn(async move {
            let result = tokio::time::timeout(COMPLETION_HANDLER_TIMEOUT, async {
                let completed = service.detect_completed().await?;
                for done in &completed {
                    info!(download_id = %done.download_id, path = %done.download_path, "download completed");
                    if let Err(e) = import_trigger
                        .notify_completed(
                            done.mapping.movie_id,
                            done.mapping.series_id,
                            done.mapping.episode_id,
                            &done.download_path,
                        )
                        .await
                    {
                        error!(download_id = %done.download_id, error = %e, "failed to notify import trigger");
                    }
                }
                service.detect_disappeared().await
            })
            .await;

            match result {
                Ok(Ok(marked)) if marked > 0 => {
                    info!(marked, "disappeared downloads marked failed");
                }
                Ok(Err(e)) => error!(error = %e, "completion/disappearance handler failed"),
                Err(_) => warn!("completion/disappearance handler timed out after 30s"),
                _ => {}
            }
            processing_imports.store(false, Ordering::SeqCst);
        });

        has_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_match_spec_cadence() {
        assert_eq!(ACTIVE_INTERVAL, Duration::from_secs(2));
        assert_eq!(IDLE_INTERVAL, Duration::from_secs(30));
    }
}
