use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::service::{SyncError, SyncService};

/// Messages to control the sync scheduler
#[derive(Debug)]
pub enum SyncSchedulerMessage {
    /// Run a pass now, outside the timer
    SyncNow,
    /// Stop the timer
    Shutdown,
}

/// Handle for the recurring sync timer
pub struct SyncScheduler {
    sender: mpsc::Sender<SyncSchedulerMessage>,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    /// Request an immediate pass. Requests made while the queue is full are
    /// dropped, since a pass is already pending.
    pub fn trigger(&self) {
        let _ = self.sender.try_send(SyncSchedulerMessage::SyncNow);
    }

    /// Cancel the timer. A pass already in flight runs to completion.
    pub async fn stop(&self) {
        // Waits for queue space so the request is never lost
        let _ = self.sender.send(SyncSchedulerMessage::Shutdown).await;
    }

    /// Wait for the timer loop to exit after [`SyncScheduler::stop`]
    pub async fn stopped(self) {
        let _ = self.handle.await;
    }
}

/// Start the recurring sync timer.
///
/// Every tick spawns a pass as its own task; a tick that finds a pass still
/// running is dropped.
pub fn start_sync_scheduler(service: SyncService, interval: Duration, run_immediately: bool) -> SyncScheduler {
    let (tx, rx) = mpsc::channel(8);

    let handle = tokio::spawn(async move {
        sync_scheduler_loop(service, interval, run_immediately, rx).await;
    });

    SyncScheduler { sender: tx, handle }
}

fn spawn_pass(service: &SyncService, reason: &'static str) {
    let service = service.clone();
    tokio::spawn(async move {
        match service.sync().await {
            Ok(report) => log::info!(
                "Sync scheduler: {} pass finished ({} created, {} updated, {} failed)",
                reason,
                report.created(),
                report.updated(),
                report.failed()
            ),
            Err(SyncError::AlreadyRunning) => {
                log::debug!("Sync scheduler: {} tick dropped, a pass is still running", reason)
            }
            Err(e) => log::error!("Sync scheduler: {} pass failed: {}", reason, e),
        }
    });
}

async fn sync_scheduler_loop(
    service: SyncService,
    interval: Duration,
    run_immediately: bool,
    mut receiver: mpsc::Receiver<SyncSchedulerMessage>,
) {
    let interval = interval.max(Duration::from_millis(1));
    log::info!("Sync scheduler started, interval {:.0}s", interval.as_secs_f64());

    if run_immediately {
        spawn_pass(&service, "startup");
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => spawn_pass(&service, "scheduled"),

            msg = receiver.recv() => {
                match msg {
                    Some(SyncSchedulerMessage::SyncNow) => spawn_pass(&service, "manual"),
                    Some(SyncSchedulerMessage::Shutdown) | None => {
                        log::info!("Sync scheduler: shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncSettings;
    use crate::sync::testing::FakeSource;
    use crate::vault::MemoryNoteStore;
    use std::sync::Arc;

    fn service(source: Arc<FakeSource>, sync_on_startup: bool) -> SyncService {
        let settings = SyncSettings {
            sync_on_startup,
            ..SyncSettings::default()
        };
        SyncService::builder(settings, source, Arc::new(MemoryNoteStore::new())).build()
    }

    #[tokio::test]
    async fn test_startup_pass_and_stop() {
        let source = Arc::new(FakeSource::new().with_notebook("A", "Alpha", 1));
        let service = service(source.clone(), true);

        let scheduler = service.start_recurring(Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.stop().await;
        scheduler.stopped().await;

        assert_eq!(source.list_calls(), 1);
        assert!(service.status().last_sync.is_some());
    }

    #[tokio::test]
    async fn test_ticks_run_passes_until_stopped() {
        let source = Arc::new(FakeSource::new().with_notebook("A", "Alpha", 1));
        let service = service(source.clone(), false);

        let scheduler = service.start_recurring(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(150)).await;
        scheduler.stop().await;
        scheduler.stopped().await;

        // Let a pass spawned by the last tick finish
        tokio::time::sleep(Duration::from_millis(50)).await;
        let calls = source.list_calls();
        assert!(calls >= 2, "expected several passes, got {}", calls);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.list_calls(), calls);
    }

    #[tokio::test]
    async fn test_ticks_during_a_pass_are_dropped() {
        let source = Arc::new(FakeSource::new().with_notebook("A", "Alpha", 1).gated());
        let service = service(source.clone(), true);

        let scheduler = service.start_recurring(Duration::from_millis(10));
        source.wait_until_listing().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        // Only the blocked startup pass ever reached the source
        assert_eq!(source.list_calls(), 1);
        assert!(service.is_running());

        scheduler.stop().await;
        scheduler.stopped().await;
        source.release();

        // The in-flight pass completes after the timer is gone
        for _ in 0..50 {
            if !service.is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!service.is_running());
        assert!(service.status().last_report.is_some());
    }

    #[tokio::test]
    async fn test_trigger_runs_a_pass_between_ticks() {
        let source = Arc::new(FakeSource::new().with_notebook("A", "Alpha", 1));
        let service = service(source.clone(), false);

        let scheduler = service.start_recurring(Duration::from_secs(3600));
        scheduler.trigger();
        for _ in 0..50 {
            if service.status().last_sync.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(source.list_calls(), 1);
        assert!(service.status().last_report.is_some());

        scheduler.stop().await;
        scheduler.stopped().await;
    }

    #[tokio::test]
    async fn test_stop_is_not_lost_behind_queued_triggers() {
        let source = Arc::new(FakeSource::new().with_notebook("A", "Alpha", 1).gated());
        let service = service(source.clone(), false);

        let scheduler = service.start_recurring(Duration::from_secs(3600));
        for _ in 0..32 {
            scheduler.trigger();
        }
        scheduler.stop().await;
        tokio::time::timeout(Duration::from_secs(5), scheduler.stopped())
            .await
            .expect("scheduler loop did not exit");

        source.release();
    }
}
