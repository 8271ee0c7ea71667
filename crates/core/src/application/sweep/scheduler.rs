// In-process interval trigger for the fixed-interval sweeps

use super::{SweepEngine, SweepReport};
use crate::application::shutdown::ShutdownToken;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Sweep scheduler
///
/// Runs pickup timeout, window start and window end in that order on every
/// tick. The reconcile sweep is never scheduled; it stays behind its gate.
pub struct SweepScheduler {
    engine: Arc<SweepEngine>,
    period: Duration,
}

impl SweepScheduler {
    pub fn new(engine: Arc<SweepEngine>, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Run the loop until shutdown (background task)
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(interval_secs = self.period.as_secs(), "Sweep scheduler started");

        let mut tick = interval(self.period);
        // A slow pass must not trigger a burst of catch-up passes
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Sweep scheduler stopped");
                    return;
                }
                _ = tick.tick() => {
                    self.run_once().await;
                }
            }
        }
    }

    /// One round of the fixed-interval sweeps
    pub async fn run_once(&self) -> Vec<SweepReport> {
        let reports = vec![
            self.engine.run_pickup_timeout().await,
            self.engine.run_window_start().await,
            self.engine.run_window_end().await,
        ];

        for report in reports.iter().filter(|r| !r.success) {
            warn!(
                sweep = %report.sweep,
                error = report.error.as_deref().unwrap_or_default(),
                errors = report.errors.len(),
                "Scheduled sweep failed"
            );
        }

        reports
    }
}
