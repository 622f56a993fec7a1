//! The Supervisor wires the configured components into a running scheduler
//! and owns graceful shutdown.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    config::AppConfig,
    executor::MonitorExecutor,
    scheduler::{Scheduler, SchedulerError},
};

/// SupervisorError represents errors that can occur while assembling the
/// Supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The Supervisor is missing a configuration.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,
    /// The Supervisor is missing an executor.
    #[error("Missing executor for Supervisor")]
    MissingExecutor,
    /// A cadence expression could not be parsed.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// The SupervisorBuilder is used to construct a Supervisor instance with all
/// necessary components, explicitly and at startup.
pub struct SupervisorBuilder {
    config: Option<AppConfig>,
    executor: Option<Arc<MonitorExecutor>>,
}

/// Runs the scheduler and stops it cleanly on the shutdown signal.
pub struct Supervisor {
    scheduler: Scheduler,
    cancellation_token: CancellationToken,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Creates a new SupervisorBuilder to configure and build a Supervisor
    /// instance.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// Runs the scheduler until Ctrl-C, then cancels both cadences and waits
    /// for them to drain.
    pub async fn run(self) {
        let token = self.cancellation_token.clone();
        let scheduler = tokio::spawn(self.scheduler.run());

        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received, stopping scheduler."),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for shutdown signal, stopping scheduler.")
            }
        }
        token.cancel();
        let _ = scheduler.await;
    }
}

impl SupervisorBuilder {
    /// Creates a new SupervisorBuilder instance.
    pub fn new() -> Self {
        Self { config: None, executor: None }
    }

    /// Sets the configuration for the Supervisor.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the executor for the Supervisor.
    pub fn executor(mut self, executor: Arc<MonitorExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Builds the Supervisor instance, validating all required components
    /// are set.
    pub fn build(self) -> Result<Supervisor, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        let executor = self.executor.ok_or(SupervisorError::MissingExecutor)?;

        let cancellation_token = CancellationToken::new();
        let scheduler = Scheduler::new(
            &config.run_schedule,
            &config.heartbeat_schedule,
            executor,
            cancellation_token.clone(),
        )?;

        Ok(Supervisor { scheduler, cancellation_token })
    }
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{baseline::MockBaselineStore, notification::MockNotifier};

    fn create_idle_executor() -> Arc<MonitorExecutor> {
        Arc::new(MonitorExecutor::new(
            vec![],
            Arc::new(MockBaselineStore::new()),
            Arc::new(MockNotifier::new()),
            Duration::from_secs(1),
        ))
    }

    #[test]
    fn build_requires_config() {
        let err = Supervisor::builder().executor(create_idle_executor()).build().unwrap_err();
        assert!(matches!(err, SupervisorError::MissingConfig));
    }

    #[test]
    fn build_requires_executor() {
        let err = Supervisor::builder().config(AppConfig::default()).build().unwrap_err();
        assert!(matches!(err, SupervisorError::MissingExecutor));
    }

    #[test]
    fn build_rejects_a_bad_cadence() {
        let config = AppConfig { run_schedule: "nonsense".to_string(), ..Default::default() };
        let err = Supervisor::builder()
            .config(config)
            .executor(create_idle_executor())
            .build()
            .unwrap_err();
        assert!(matches!(err, SupervisorError::Scheduler(_)));
    }

    #[test]
    fn build_succeeds_with_defaults() {
        let result = Supervisor::builder()
            .config(AppConfig::default())
            .executor(create_idle_executor())
            .build();
        assert!(result.is_ok());
    }
}
