use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vigil::{
    baseline::FileBaselineStore,
    config::AppConfig,
    executor::MonitorExecutor,
    http_client::{build_http_client, build_notification_client},
    monitors,
    notification::TelegramNotifier,
    supervisor::Supervisor,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to `vigil.yaml` in the
    /// working directory; all settings have defaults).
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the scheduler daemon with both cadences.
    Run,
    /// Runs one compare-and-notify cycle immediately, then exits.
    Check,
    /// Sends the liveness message immediately, then exits.
    Heartbeat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    let subscriber =
        FmtSubscriber::builder().with_env_filter(EnvFilter::from_default_env()).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();

    tracing::debug!("Loading application configuration...");
    let config = AppConfig::new(cli.config.as_deref())?;
    tracing::debug!(
        baseline_dir = %config.baseline_dir.display(),
        run_schedule = %config.run_schedule,
        heartbeat_schedule = %config.heartbeat_schedule,
        "Configuration loaded."
    );

    let executor = build_executor(&config)?;

    match cli.command {
        Commands::Run => {
            let supervisor = Supervisor::builder().config(config).executor(executor).build()?;
            tracing::info!("Supervisor initialized, starting scheduler...");
            supervisor.run().await;
        }
        Commands::Check => {
            let summary = executor.run_cycle().await;
            tracing::info!(
                processed = summary.processed,
                changed = summary.changed,
                failed = summary.failed,
                "Cycle complete."
            );
        }
        Commands::Heartbeat => {
            executor.send_heartbeat().await?;
            tracing::info!("Heartbeat sent.");
        }
    }

    Ok(())
}

/// Assembles the executor pipeline: HTTP clients, Telegram notifier (env
/// credentials, checked here so a misconfigured process halts before any
/// monitor runs), file-backed baseline store, and the monitor registry.
///
/// Monitor fetches share a retrying client; the notifier gets its own
/// non-retrying client, since delivery is at-most-once per send.
fn build_executor(config: &AppConfig) -> Result<Arc<MonitorExecutor>, Box<dyn std::error::Error>> {
    let fetch_client = Arc::new(build_http_client(&config.http_retry, config.connect_timeout)?);
    let notification_client = Arc::new(build_notification_client(config.connect_timeout)?);

    let notifier =
        Arc::new(TelegramNotifier::from_env(&config.telegram_api_base, notification_client)?);
    let store = Arc::new(FileBaselineStore::new(config.baseline_dir.clone()));

    let registry = monitors::build_registry(&config.monitors, fetch_client);
    tracing::info!(count = registry.len(), "Monitor registry built.");

    Ok(Arc::new(MonitorExecutor::new(registry, store, notifier, config.fetch_timeout)))
}
