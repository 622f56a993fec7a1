//! The executor runs the compare-and-notify protocol over all registered
//! monitors for one cycle, with per-monitor failure isolation: one monitor's
//! fault never prevents the others from running.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    baseline::{BaselineStore, StoreError},
    monitor::{FetchError, Monitor},
    notification::{Notifier, error::SendError},
};

/// Outcome counters for one execution cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    /// Monitors that completed the protocol, changed or not.
    pub processed: usize,
    /// Monitors whose value differed from the baseline.
    pub changed: usize,
    /// Monitors that failed at the fetch or store step.
    pub failed: usize,
}

/// Failure of a single monitor's run, caught at the monitor boundary.
#[derive(Debug, Error)]
enum CheckError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Runs the full set of registered monitors against the baseline store and
/// dispatches change notifications.
pub struct MonitorExecutor {
    monitors: Vec<Arc<dyn Monitor>>,
    store: Arc<dyn BaselineStore>,
    notifier: Arc<dyn Notifier>,
    fetch_timeout: Duration,
    /// Serializes whole cycles, so an overlapping trigger never races a
    /// monitor against itself.
    cycle_lock: Mutex<()>,
}

/// Compares two observed values the way the executor diffs them: after
/// trimming surrounding whitespace, case-insensitively.
fn normalized_equal(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl MonitorExecutor {
    /// Creates a new executor over the given registry, in registration order.
    pub fn new(
        monitors: Vec<Arc<dyn Monitor>>,
        store: Arc<dyn BaselineStore>,
        notifier: Arc<dyn Notifier>,
        fetch_timeout: Duration,
    ) -> Self {
        tracing::info!(count = monitors.len(), "MonitorExecutor initialized.");
        Self { monitors, store, notifier, fetch_timeout, cycle_lock: Mutex::new(()) }
    }

    /// Display names of every registered monitor, in registration order.
    pub fn monitor_names(&self) -> Vec<&str> {
        self.monitors.iter().map(|m| m.display_name()).collect()
    }

    /// Runs one compare-and-notify cycle over all registered monitors.
    ///
    /// Each monitor is checked in turn; a fetch, store, or send failure is
    /// logged at the monitor boundary and the cycle continues with the next
    /// monitor.
    pub async fn run_cycle(&self) -> CycleSummary {
        let _guard = self.cycle_lock.lock().await;

        if self.monitors.is_empty() {
            tracing::warn!("No monitors registered, nothing to execute.");
            return CycleSummary::default();
        }

        let mut summary = CycleSummary::default();
        for monitor in &self.monitors {
            let name = monitor.display_name();
            tracing::info!(monitor = %name, "Starting monitor check.");
            match self.check_one(monitor.as_ref()).await {
                Ok(changed) => {
                    summary.processed += 1;
                    if changed {
                        summary.changed += 1;
                    }
                    tracing::info!(monitor = %name, changed, "Monitor check finished.");
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(monitor = %name, error = %e, "Monitor check failed.");
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            changed = summary.changed,
            failed = summary.failed,
            "All monitors processed."
        );
        summary
    }

    /// Runs the protocol for one monitor. Returns whether a change was
    /// detected.
    async fn check_one(&self, monitor: &dyn Monitor) -> Result<bool, CheckError> {
        let fetched =
            match tokio::time::timeout(self.fetch_timeout, monitor.fetch_current_value()).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(FetchError::Network(format!(
                        "fetch exceeded the {:?} timeout",
                        self.fetch_timeout
                    ))
                    .into());
                }
            };

        let new_value = fetched.trim();
        let stored = self.store.read(monitor.identity()).await?;
        let old_value = stored.trim();
        tracing::debug!(monitor = %monitor.display_name(), old = %old_value, new = %new_value, "Comparing against baseline.");

        if normalized_equal(old_value, new_value) {
            return Ok(false);
        }

        self.store.write(monitor.identity(), new_value).await?;

        let message = format!(
            "\u{2692} {} change detected!\nOld: '{}',\nNew: '{}'",
            monitor.display_name(),
            old_value,
            new_value
        );
        // Delivery failure is logged, not escalated: the baseline is already
        // updated and the monitor's run counts as processed.
        if let Err(e) = self.notifier.send(&message).await {
            tracing::error!(monitor = %monitor.display_name(), error = %e, "Change notification failed to send.");
        }

        Ok(true)
    }

    /// Sends the liveness message listing every registered monitor's display
    /// name, in registration order. Touches neither the baseline store nor
    /// any external source.
    pub async fn send_heartbeat(&self) -> Result<(), SendError> {
        let mut message =
            String::from("\u{2692} LiveSign\nJust as info, these Monitors are active:\n");
        for name in self.monitor_names() {
            message.push_str("- ");
            message.push_str(name);
            message.push('\n');
        }

        tracing::info!(count = self.monitors.len(), "Sending heartbeat.");
        self.notifier.send(&message).await
    }
}
