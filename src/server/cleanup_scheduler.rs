use crate::domain_port::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Periodically sweeps expired refresh tokens out of the store.
pub struct CleanupScheduler {
    store: Arc<dyn RefreshTokenStore>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl CleanupScheduler {
    pub fn new(
        store: Arc<dyn RefreshTokenStore>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            store,
            interval,
            cancellation_token,
        }
    }

    /// One sweep. Failures are logged and left for the next tick.
    pub async fn sweep_once(&self) -> Option<u64> {
        match self.store.cleanup().await {
            Ok(removed) => {
                debug!(removed, "refresh token cleanup finished");
                Some(removed)
            }
            Err(e) => {
                error!(error = %e, "refresh token cleanup failed");
                None
            }
        }
    }

    pub async fn run(&self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, "cleanup scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    info!("cleanup scheduler shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }
}
