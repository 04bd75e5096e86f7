use crate::session::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to the background sweep task.
///
/// Dropping the handle does not stop the task; call [`SweepHandle::shutdown`]
/// for a clean stop.
pub struct SweepHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Spawn the periodic sweep for a session manager.
    ///
    /// The interval comes from the manager's `sweep_interval_secs`
    /// setting, passed in here so the manager itself stays runtime-free.
    pub fn spawn(manager: Arc<SessionManager>, interval: Duration) -> Self {
        let (stop, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a fresh
            // manager isn't swept before it has done anything
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        manager.sweep();
                    }
                    changed = stopped.changed() => {
                        if changed.is_err() || *stopped.borrow() {
                            tracing::debug!("Sweep task stopping");
                            break;
                        }
                    }
                }
            }
        });

        Self { stop, task }
    }

    /// Signal the sweep task to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}
