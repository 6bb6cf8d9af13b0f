//! Background driver for [`SessionManager::check_and_maybe_refresh`].
//!
//! Polls on a fixed interval while a session is authenticated, checks once
//! immediately whenever a session becomes authenticated, and sleeps on the
//! session channel while anonymous.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::SessionManager;

/// How often an authenticated session is checked.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Handle to the polling task. Dropping it stops polling.
#[derive(Debug)]
pub struct RefreshScheduler {
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// A zero `interval` falls back to [`DEFAULT_REFRESH_INTERVAL_SECS`].
    pub fn spawn(manager: Arc<SessionManager>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            warn!("Zero refresh interval, using default");
            Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS)
        } else {
            interval
        };
        info!(interval_secs = interval.as_secs(), "Starting token refresh scheduler");
        let handle = tokio::spawn(run(manager, interval));
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(manager: Arc<SessionManager>, interval: Duration) {
    let mut rx = manager.subscribe();

    loop {
        while !rx.borrow_and_update().is_authenticated() {
            if rx.changed().await.is_err() {
                return;
            }
        }

        debug!("Session authenticated, polling token expiry");
        // The first tick completes immediately.
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = manager.check_and_maybe_refresh().await;
                    debug!(?outcome, "Scheduled token check");
                    if !manager.is_authenticated() {
                        break;
                    }
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    if !rx.borrow_and_update().is_authenticated() {
                        break;
                    }
                }
            }
        }

        debug!("Session anonymous, refresh polling paused");
    }
}
