//! Periodic expiry sweep over the session table.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use meridian_core::config::session::SessionConfig;
use meridian_core::error::AppError;

use super::store::SessionStore;

/// Marks time-expired sessions as `Expired` on an interval.
///
/// Expiry is already detected lazily at validation time; the sweep exists
/// so reporting and session listings converge without traffic. Rows are
/// transitioned, never deleted — the audit trail stays intact.
#[derive(Clone)]
pub struct SessionSweeper {
    /// Session store for the bulk transition.
    store: Arc<SessionStore>,
    /// Sweep interval.
    interval: Duration,
}

impl std::fmt::Debug for SessionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSweeper")
            .field("interval", &self.interval)
            .finish()
    }
}

impl SessionSweeper {
    /// Creates a new sweeper.
    pub fn new(store: Arc<SessionStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            interval: Duration::from_secs(config.sweep_interval_minutes * 60),
        }
    }

    /// Runs a single sweep cycle over both expiry conditions: absolute
    /// timeout and idle timeout. Returns the number of sessions expired.
    pub async fn run_once(&self) -> Result<u64, AppError> {
        let expired = self.store.mark_all_expired().await?;
        let idle = self.store.mark_all_idle().await?;
        if expired > 0 || idle > 0 {
            info!(expired = expired, idle = idle, "Stale sessions swept");
        }
        Ok(expired + idle)
    }

    /// Runs the sweep loop until the task is aborted.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                error!(error = %e, "Session sweep failed");
            }
        }
    }
}
