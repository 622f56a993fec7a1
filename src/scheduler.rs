//! Time-driven triggering of the executor: a recurring run cadence for the
//! compare-and-notify cycle and a sparser heartbeat cadence for the liveness
//! message, each on its own task.

use std::{str::FromStr, sync::Arc, time::Duration};

use chrono::Utc;
use cron::Schedule;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::executor::MonitorExecutor;

/// Errors raised while constructing the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A cadence could not be parsed as a cron expression.
    #[error("Invalid cron expression '{expression}': {source}")]
    InvalidSchedule {
        /// The offending expression.
        expression: String,
        /// The parse failure reported by the cron parser.
        source: cron::error::Error,
    },
}

/// Drives the executor on two independent cron cadences until cancelled.
pub struct Scheduler {
    run_schedule: Schedule,
    heartbeat_schedule: Schedule,
    executor: Arc<MonitorExecutor>,
    cancellation_token: CancellationToken,
}

/// Time until the schedule's next occurrence, or `None` when the schedule
/// has run out.
fn next_delay(schedule: &Schedule) -> Option<Duration> {
    let next = schedule.upcoming(Utc).next()?;
    Some((next - Utc::now()).to_std().unwrap_or(Duration::ZERO))
}

fn parse_schedule(expression: &str) -> Result<Schedule, SchedulerError> {
    Schedule::from_str(expression).map_err(|source| SchedulerError::InvalidSchedule {
        expression: expression.to_string(),
        source,
    })
}

/// Sleeps until the schedule's next occurrence, then runs one full cycle.
async fn run_loop(
    schedule: Schedule,
    executor: Arc<MonitorExecutor>,
    token: CancellationToken,
) {
    while let Some(delay) = next_delay(&schedule) {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("Run loop cancelled.");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
        let summary = executor.run_cycle().await;
        tracing::info!(
            processed = summary.processed,
            changed = summary.changed,
            failed = summary.failed,
            "Scheduled run cycle complete."
        );
    }
    tracing::warn!("Run schedule has no further occurrences, loop finished.");
}

/// Sleeps until the schedule's next occurrence, then sends the heartbeat.
async fn heartbeat_loop(
    schedule: Schedule,
    executor: Arc<MonitorExecutor>,
    token: CancellationToken,
) {
    while let Some(delay) = next_delay(&schedule) {
        tokio::select! {
            _ = token.cancelled() => {
                tracing::debug!("Heartbeat loop cancelled.");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
        if let Err(e) = executor.send_heartbeat().await {
            tracing::error!(error = %e, "Heartbeat delivery failed.");
        }
    }
    tracing::warn!("Heartbeat schedule has no further occurrences, loop finished.");
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("run_schedule", &self.run_schedule)
            .field("heartbeat_schedule", &self.heartbeat_schedule)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler from the two cadence expressions, parsed once at
    /// startup. The cadences are not changeable at runtime.
    pub fn new(
        run_expression: &str,
        heartbeat_expression: &str,
        executor: Arc<MonitorExecutor>,
        cancellation_token: CancellationToken,
    ) -> Result<Self, SchedulerError> {
        Ok(Self {
            run_schedule: parse_schedule(run_expression)?,
            heartbeat_schedule: parse_schedule(heartbeat_expression)?,
            executor,
            cancellation_token,
        })
    }

    /// Runs both cadences until the cancellation token fires, then drains
    /// the tasks.
    pub async fn run(self) {
        let mut tasks = JoinSet::new();
        tasks.spawn(run_loop(
            self.run_schedule,
            Arc::clone(&self.executor),
            self.cancellation_token.clone(),
        ));
        tasks.spawn(heartbeat_loop(
            self.heartbeat_schedule,
            self.executor,
            self.cancellation_token,
        ));

        while tasks.join_next().await.is_some() {}
        tracing::info!("Scheduler stopped.");
    }
}
