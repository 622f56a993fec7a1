//! Integration tests for the compare-and-notify protocol.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use vigil::{
    baseline::{BaselineStore, FileBaselineStore},
    executor::{CycleSummary, MonitorExecutor},
    monitor::{FetchError, Monitor},
    notification::{Notifier, error::SendError},
};

/// A monitor that replays a scripted sequence of fetch results, one per
/// cycle.
struct ScriptedMonitor {
    identity: &'static str,
    name: &'static str,
    responses: Mutex<VecDeque<Result<String, FetchError>>>,
}

impl ScriptedMonitor {
    fn new(
        identity: &'static str,
        name: &'static str,
        responses: Vec<Result<String, FetchError>>,
    ) -> Arc<Self> {
        Arc::new(Self { identity, name, responses: Mutex::new(responses.into()) })
    }
}

#[async_trait]
impl Monitor for ScriptedMonitor {
    fn identity(&self) -> &str {
        self.identity
    }

    fn display_name(&self) -> &str {
        self.name
    }

    async fn fetch_current_value(&self) -> Result<String, FetchError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Extraction("script exhausted".to_string())))
    }
}

/// A notifier that records every message, optionally failing each delivery.
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    fn new() -> Arc<Self> {
        Arc::new(Self { messages: Mutex::new(Vec::new()), fail: false })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { messages: Mutex::new(Vec::new()), fail: true })
    }

    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), SendError> {
        self.messages.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(SendError::RemoteRejected {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "simulated outage".to_string(),
            });
        }
        Ok(())
    }
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn first_run_creates_baseline_and_notifies() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileBaselineStore::new(dir.path()));
    let notifier = RecordingNotifier::new();

    let value =
        "- Bedrock Server v1.21.50 (https://example.com/bedrock-server-1.21.50.zip)".to_string();
    let monitor =
        ScriptedMonitor::new("minecraft.dat", "Minecraft Current Bedrock Server", vec![Ok(
            value.clone(),
        )]);

    let executor = MonitorExecutor::new(
        vec![monitor],
        Arc::clone(&store) as Arc<dyn BaselineStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        FETCH_TIMEOUT,
    );

    let summary = executor.run_cycle().await;
    assert_eq!(summary, CycleSummary { processed: 1, changed: 1, failed: 0 });

    assert_eq!(store.read("minecraft.dat").await.unwrap(), value);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Minecraft Current Bedrock Server"));
    assert!(messages[0].contains("Old: ''"));
    assert!(messages[0].contains(&value));
}

#[tokio::test]
async fn second_cycle_with_unchanged_value_is_silent() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileBaselineStore::new(dir.path()));
    let notifier = RecordingNotifier::new();

    let value = "- Bedrock Server v1.21.50 (https://example.com/b.zip)";
    // Second fetch returns the same entry with different surrounding
    // whitespace; the executor must treat it as unchanged.
    let monitor = ScriptedMonitor::new("minecraft.dat", "Bedrock", vec![
        Ok(value.to_string()),
        Ok(format!("   {value} \n")),
    ]);

    let executor = MonitorExecutor::new(
        vec![monitor],
        Arc::clone(&store) as Arc<dyn BaselineStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        FETCH_TIMEOUT,
    );

    let first = executor.run_cycle().await;
    assert_eq!(first.changed, 1);
    let second = executor.run_cycle().await;
    assert_eq!(second, CycleSummary { processed: 1, changed: 0, failed: 0 });

    assert_eq!(notifier.messages().len(), 1);
    assert_eq!(store.read("minecraft.dat").await.unwrap(), value);
}

#[tokio::test]
async fn case_only_difference_is_not_a_change() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileBaselineStore::new(dir.path()));
    store.write("m.dat", "Value One").await.unwrap();
    let notifier = RecordingNotifier::new();

    let monitor = ScriptedMonitor::new("m.dat", "M", vec![Ok("VALUE ONE".to_string())]);
    let executor = MonitorExecutor::new(
        vec![monitor],
        Arc::clone(&store) as Arc<dyn BaselineStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        FETCH_TIMEOUT,
    );

    let summary = executor.run_cycle().await;
    assert_eq!(summary.changed, 0);
    assert!(notifier.messages().is_empty());
    // Baseline keeps the original casing since no write happened.
    assert_eq!(store.read("m.dat").await.unwrap(), "Value One");
}

#[tokio::test]
async fn changed_value_updates_baseline_and_notifies_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileBaselineStore::new(dir.path()));
    store.write("m.dat", "old value").await.unwrap();
    let notifier = RecordingNotifier::new();

    let monitor = ScriptedMonitor::new("m.dat", "M", vec![Ok("new value".to_string())]);
    let executor = MonitorExecutor::new(
        vec![monitor],
        Arc::clone(&store) as Arc<dyn BaselineStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        FETCH_TIMEOUT,
    );

    let summary = executor.run_cycle().await;
    assert_eq!(summary.changed, 1);
    assert_eq!(store.read("m.dat").await.unwrap(), "new value");

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Old: 'old value'"));
    assert!(messages[0].contains("New: 'new value'"));
}

#[tokio::test]
async fn failing_monitor_does_not_block_the_next_one() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileBaselineStore::new(dir.path()));
    let notifier = RecordingNotifier::new();

    let broken = ScriptedMonitor::new("a.dat", "Broken", vec![Err(FetchError::Extraction(
        "no links matched".to_string(),
    ))]);
    let healthy = ScriptedMonitor::new("b.dat", "Healthy", vec![Ok("fresh".to_string())]);

    let executor = MonitorExecutor::new(
        vec![broken, healthy],
        Arc::clone(&store) as Arc<dyn BaselineStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        FETCH_TIMEOUT,
    );

    let summary = executor.run_cycle().await;
    assert_eq!(summary, CycleSummary { processed: 1, changed: 1, failed: 1 });

    // The failing monitor wrote nothing; the healthy one completed fully.
    assert_eq!(store.read("a.dat").await.unwrap(), "");
    assert_eq!(store.read("b.dat").await.unwrap(), "fresh");
    assert_eq!(notifier.messages().len(), 1);
}

#[tokio::test]
async fn notification_failure_still_counts_as_processed() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileBaselineStore::new(dir.path()));
    let notifier = RecordingNotifier::failing();

    let monitor = ScriptedMonitor::new("m.dat", "M", vec![Ok("value".to_string())]);
    let executor = MonitorExecutor::new(
        vec![monitor],
        Arc::clone(&store) as Arc<dyn BaselineStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        FETCH_TIMEOUT,
    );

    let summary = executor.run_cycle().await;
    assert_eq!(summary, CycleSummary { processed: 1, changed: 1, failed: 0 });
    // The baseline was written before the delivery attempt.
    assert_eq!(store.read("m.dat").await.unwrap(), "value");
}

#[tokio::test]
async fn heartbeat_lists_every_monitor_in_registration_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileBaselineStore::new(dir.path()));
    let notifier = RecordingNotifier::new();

    let first = ScriptedMonitor::new("a.dat", "Alpha Watch", vec![]);
    let second = ScriptedMonitor::new("b.dat", "Beta Watch", vec![]);

    let executor = MonitorExecutor::new(
        vec![first, second],
        Arc::clone(&store) as Arc<dyn BaselineStore>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        FETCH_TIMEOUT,
    );

    executor.send_heartbeat().await.unwrap();

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("- Alpha Watch\n- Beta Watch\n"));
    // Exactly one mention per monitor.
    assert_eq!(messages[0].matches("Alpha Watch").count(), 1);
    assert_eq!(messages[0].matches("Beta Watch").count(), 1);
}
