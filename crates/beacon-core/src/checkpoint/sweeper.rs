//! Periodic retention cleanup task.

use crate::checkpoint::service::CheckpointService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Background sweeper running [`CheckpointService::cleanup`] on a fixed
/// interval, independent of request traffic.
pub struct CleanupSweeper {
    service: Arc<CheckpointService>,
    period: Duration,
    shutdown_tx: broadcast::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CleanupSweeper {
    /// Create a sweeper for the given service.
    ///
    /// The sweep period comes from the service's retention configuration
    /// (`auto_cleanup_interval_ms`).
    pub fn new(service: Arc<CheckpointService>) -> Self {
        let period = Duration::from_millis(service.retention().auto_cleanup_interval_ms);
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            service,
            period,
            shutdown_tx,
            task: Mutex::new(None),
        }
    }

    /// Start the periodic sweep. Calling start on a running sweeper is a
    /// no-op.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return;
        }

        let service = Arc::clone(&self.service);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // interval's first tick fires immediately; the first sweep
            // should happen one period in.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match service.cleanup().await {
                            Ok(report) if report.deleted_count > 0 => {
                                info!(
                                    deleted = report.deleted_count,
                                    failed = report.failed_count,
                                    "Periodic checkpoint cleanup"
                                );
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "Periodic checkpoint cleanup failed");
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });

        *task = Some(handle);
        info!(interval_ms = self.period.as_millis() as u64, "Started checkpoint cleanup sweeper");
    }

    /// Stop the periodic sweep and abort the background task.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
            info!("Stopped checkpoint cleanup sweeper");
        }
    }

    /// Whether the sweep task is currently running.
    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }
}
