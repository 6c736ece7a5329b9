#![allow(dead_code)]

/// Common test utilities shared by the integration suites:
/// - proptest configuration preset
/// - raw session-key generators
/// - recording notifier double and wiring helpers
use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use remindbot::bus::{Notifier, OutboundMessage};
use remindbot::calendar::HolidayCalendar;
use remindbot::reminder::ops::{Requester, ReminderOps};
use remindbot::reminder::types::ReminderStore;
use remindbot::scheduler::ReminderScheduler;
use remindbot::store::{file::FileBackend, ReminderBackend};

/// Standard proptest configuration with 100 iterations.
pub fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    }
}

/// Raw group/channel/private session keys on non-wechat platforms.
pub fn generic_raw_key() -> impl Strategy<Value = String> {
    (
        "[a-z]{2,8}",
        prop_oneof![
            Just("GroupMessage"),
            Just("ChannelMessage"),
            Just("PrivateMessage")
        ],
        "[a-zA-Z0-9]{1,12}",
    )
        .prop_map(|(platform, kind, id)| format!("{platform}:{kind}:{id}"))
}

pub fn creator_id() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,10}"
}

/// Notifier double that records every delivered message.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<OutboundMessage>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, message: OutboundMessage) -> anyhow::Result<()> {
        self.sent.lock().await.push(message);
        Ok(())
    }
}

impl RecordingNotifier {
    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

/// Notifier double that always fails, for delivery-error paths.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn deliver(&self, _message: OutboundMessage) -> anyhow::Result<()> {
        anyhow::bail!("transport unavailable")
    }
}

/// A fully wired scheduler over a temp-dir file backend and an unroutable
/// calendar source (every date falls back to plain weekday rules unless the
/// cache file is seeded).
pub struct TestHarness {
    pub dir: tempfile::TempDir,
    pub store: Arc<RwLock<ReminderStore>>,
    pub backend: Arc<dyn ReminderBackend>,
    pub scheduler: Arc<ReminderScheduler>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_holiday_overrides("").await
    }

    /// `overrides` is the inner `"MM-DD": bool` list, seeded into the cache
    /// for both test years (2024 and 2099).
    pub async fn with_holiday_overrides(overrides: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("holiday_cache.json");
        std::fs::write(
            &cache_path,
            format!(
                r#"{{"last_update": "{}", "2024": {{"data": {{{ov}}}}}, "2099": {{"data": {{{ov}}}}}}}"#,
                chrono::Local::now().to_rfc3339(),
                ov = overrides
            ),
        )
        .unwrap();

        let backend: Arc<dyn ReminderBackend> =
            Arc::new(FileBackend::new(dir.path().join("reminders.json")));
        let store = Arc::new(RwLock::new(backend.load().await));
        let calendar = Arc::new(HolidayCalendar::new("http://127.0.0.1:9".into(), cache_path));
        let notifier = Arc::new(RecordingNotifier::default());
        let scheduler = ReminderScheduler::new(
            store.clone(),
            backend.clone(),
            calendar,
            notifier.clone(),
        );
        Self {
            dir,
            store,
            backend,
            scheduler,
            notifier,
        }
    }

    pub fn ops(&self, unique_session: bool) -> ReminderOps {
        ReminderOps::new(
            self.store.clone(),
            self.backend.clone(),
            self.scheduler.clone(),
            unique_session,
        )
    }
}

pub fn record(
    text: &str,
    date_time: &str,
    repeat: remindbot::reminder::types::RepeatKind,
    gate: Option<remindbot::reminder::types::HolidayGate>,
) -> remindbot::reminder::types::ReminderRecord {
    remindbot::reminder::types::ReminderRecord {
        text: text.to_string(),
        date_time: date_time.to_string(),
        user_name: Some("alice".to_string()),
        repeat_type: repeat,
        holiday_type: gate,
        creator_id: Some("alice".to_string()),
        creator_name: Some("Alice".to_string()),
        is_task: false,
    }
}

pub fn requester(id: &str) -> Requester {
    Requester {
        id: id.to_string(),
        name: format!("user-{id}"),
    }
}
