//! Background loop that triggers crawl runs on an interval.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jobhound_core::SchedulerConfig;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::scheduler::is_run_due;

/// How often the loop re-checks whether a run is due.
const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// The work the scheduler drives.
#[async_trait::async_trait]
pub trait CrawlRunner: Send + Sync {
    /// Start timestamp of the most recent run (RFC 3339), if any.
    async fn last_run_started_at(&self) -> Option<String>;

    /// Execute one full crawl run.
    async fn run_crawl(&self);
}

/// Handle to a spawned scheduler loop.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!("Scheduler task join failed: {e}");
        }
    }
}

/// Periodic crawl scheduler.
pub struct CrawlScheduler;

impl CrawlScheduler {
    /// Spawn the scheduling loop. Returns `None` when scheduling is
    /// disabled in the config.
    #[must_use]
    pub fn spawn(config: SchedulerConfig, runner: Arc<dyn CrawlRunner>) -> Option<SchedulerHandle> {
        if !config.enabled {
            info!("Scheduler disabled");
            return None;
        }
        Some(Self::spawn_with_poll(config, runner, POLL_INTERVAL))
    }

    /// Spawn with a custom poll interval. Tests use short intervals.
    #[must_use]
    pub fn spawn_with_poll(
        config: SchedulerConfig,
        runner: Arc<dyn CrawlRunner>,
        poll: Duration,
    ) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            info!(
                interval_hours = config.interval_hours,
                "Scheduler loop started"
            );
            let mut ticker = tokio::time::interval(poll);
            // The first tick fires immediately; consume it so the first
            // due-check happens one poll interval in.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let last = runner.last_run_started_at().await;
                        let now = Utc::now().to_rfc3339();
                        if is_run_due(last.as_deref(), config.interval_hours, &now) {
                            info!("Crawl run due, starting");
                            runner.run_crawl().await;
                        } else {
                            debug!("Crawl run not due yet");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("Scheduler loop stopping");
                        break;
                    }
                }
            }
        });

        SchedulerHandle {
            shutdown_tx,
            handle,
        }
    }
}
