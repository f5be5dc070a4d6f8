//! Background refresh scheduler.
//!
//! Runs one aggregation immediately on start, then one per interval, and
//! overwrites the cache each time regardless of whether the current entry
//! has expired. Consumer reads therefore only ever touch the cache.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::service::EventService;

pub struct RefreshScheduler {
    service: Arc<EventService>,
    interval: Duration,
}

/// Handle to a running scheduler. Dropping it also stops the loop, but
/// only [`RefreshHandle::shutdown`] waits for the task to finish.
pub struct RefreshHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn new(service: Arc<EventService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Spawn the refresh loop on the current runtime.
    pub fn start(self) -> RefreshHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_refresh_loop(self.service, self.interval, shutdown_rx));
        RefreshHandle { shutdown_tx, task }
    }
}

impl RefreshHandle {
    /// Signal the loop to stop and wait for it. A refresh in flight is
    /// abandoned; the cache keeps whatever it held before.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(err) = self.task.await {
            tracing::error!("Refresh task ended abnormally: {}", err);
        }
    }
}

/// Refresh loop body. Errors are logged by the service and the loop
/// continues; a failed run never stops the scheduler.
async fn run_refresh_loop(
    service: Arc<EventService>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!("Event refresh started (interval: {}s)", interval.as_secs());

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_rx.changed() => break,
        }

        tokio::select! {
            _ = service.refresh() => {}
            _ = shutdown_rx.changed() => break,
        }
    }

    tracing::info!("Event refresh stopped cleanly");
}
