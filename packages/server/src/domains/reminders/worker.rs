//! Background loop that sends event reminders.
//!
//! The worker polls on a fixed interval and stops when the shared shutdown
//! token is cancelled. It runs on the deferred task tracker, so server
//! shutdown waits for an in-flight pass to finish.

use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::domains::reminders::actions::send_due_reminders;
use crate::kernel::ServerDeps;

/// Polling cadence of the reminder worker
#[derive(Debug, Clone, Copy)]
pub struct ReminderSettings {
    pub interval: Duration,
    /// Width of each reminder window; must exceed `interval`
    pub slack: chrono::Duration,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            slack: chrono::Duration::minutes(10),
        }
    }
}

pub struct ReminderWorker {
    deps: ServerDeps,
    settings: ReminderSettings,
}

impl ReminderWorker {
    pub fn new(deps: ServerDeps, settings: ReminderSettings) -> Self {
        Self { deps, settings }
    }

    /// Run on the deferred task tracker until it shuts down
    pub fn start(self) {
        let tasks = self.deps.tasks.clone();
        let shutdown = tasks.shutdown_token();
        tasks.spawn(self.run(shutdown));
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.settings.interval.as_secs(),
            slack_minutes = self.settings.slack.num_minutes(),
            "reminder worker starting"
        );

        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = send_due_reminders(Utc::now(), self.settings.slack, &self.deps).await {
                        error!(error = %e, "reminder pass failed");
                    }
                }
            }
        }

        info!("reminder worker stopped");
    }
}
