//! Backlog Sweeper
//!
//! Background task that runs one [`SearchSync::sweep`] per interval tick
//! until the shutdown flag flips.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::application::services::SearchSync;

pub struct BacklogSweeper {
    sync: Arc<SearchSync>,
    period: Duration,
    batch_size: i64,
}

impl BacklogSweeper {
    pub fn new(sync: Arc<SearchSync>, period: Duration, batch_size: i64) -> Self {
        Self {
            sync,
            period,
            batch_size,
        }
    }

    /// Sweep on every tick until `shutdown` reads `true` or its sender drops.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.period.as_secs(),
            batch_size = self.batch_size,
            "Backlog sweeper started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Backlog sweeper stopped");
    }

    /// One sweep. Failures wait for the next tick.
    async fn tick(&self) {
        match self.sync.sweep(self.batch_size).await {
            Ok(report) => {
                tracing::debug!(
                    attempted = report.attempted(),
                    indexed = report.indexed(),
                    "Backlog sweep tick"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Backlog sweep failed");
            }
        }
    }
}
