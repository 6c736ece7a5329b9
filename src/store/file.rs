//! Flat-file JSON reminder store.
//!
//! The on-disk shape is a JSON object keyed by session key, each value an
//! array of reminder objects. A corrupt file is backed up to `<file>.bak` and
//! replaced with an empty store so startup always succeeds.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::reminder::types::ReminderStore;
use crate::store::{prune_expired, ReminderBackend};

pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn ensure_parent(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn back_up_corrupt_file(&self) {
        let backup = self.path.with_extension("json.bak");
        match std::fs::rename(&self.path, &backup) {
            Ok(()) => info!(backup = %backup.display(), "backed up corrupt reminder store"),
            Err(e) => error!(error = %e, "failed to back up corrupt reminder store"),
        }
    }
}

#[async_trait]
impl ReminderBackend for FileBackend {
    async fn load(&self) -> ReminderStore {
        if let Err(e) = self.ensure_parent() {
            error!(error = %e, "failed to create reminder data directory");
            return ReminderStore::new();
        }

        if !self.path.exists() {
            return ReminderStore::new();
        }

        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "failed to read reminder store");
                return ReminderStore::new();
            }
        };
        if text.trim().is_empty() {
            return ReminderStore::new();
        }

        match serde_json::from_str::<ReminderStore>(&text) {
            Ok(store) => {
                info!(
                    sessions = store.len(),
                    path = %self.path.display(),
                    "loaded reminder store"
                );
                store
            }
            Err(e) => {
                warn!(error = %e, "reminder store is corrupt, resetting to empty");
                self.back_up_corrupt_file();
                ReminderStore::new()
            }
        }
    }

    async fn save(&self, store: &ReminderStore) -> bool {
        let mut pruned = store.clone();
        prune_expired(&mut pruned);

        let json = match serde_json::to_string_pretty(&pruned) {
            Ok(j) => j,
            Err(e) => {
                error!(error = %e, "failed to serialize reminder store");
                return false;
            }
        };

        if let Err(e) = self.ensure_parent() {
            error!(error = %e, "failed to create reminder data directory");
            return false;
        }
        match std::fs::write(&self.path, json) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, path = %self.path.display(), "failed to write reminder store");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::types::ReminderRecord;

    fn record(text: &str, date_time: &str, repeat: &str) -> ReminderRecord {
        serde_json::from_value(serde_json::json!({
            "text": text,
            "date_time": date_time,
            "user_name": "u1",
            "repeat_type": repeat,
            "creator_id": "u1",
            "creator_name": "User",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("reminders.json"));
        assert!(backend.load().await.is_empty());
    }

    #[tokio::test]
    async fn save_load_roundtrip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("reminders.json"));

        let mut store = ReminderStore::new();
        store.insert(
            "qq:GroupMessage:1".into(),
            vec![record("meeting", "2099-03-04 09:00", "weekly")],
        );
        assert!(backend.save(&store).await);
        assert_eq!(backend.load().await, store);
    }

    #[tokio::test]
    async fn corrupt_file_is_backed_up_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        std::fs::write(&path, "{not json").unwrap();

        let backend = FileBackend::new(path.clone());
        assert!(backend.load().await.is_empty());
        assert!(dir.path().join("reminders.json.bak").exists());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn save_prunes_expired_one_shots() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("reminders.json"));

        let mut store = ReminderStore::new();
        store.insert(
            "s1".into(),
            vec![
                record("old", "2000-01-01 08:00", "none"),
                record("new", "2099-01-01 08:00", "none"),
            ],
        );
        store.insert("s2".into(), vec![record("gone", "2000-01-01 08:00", "none")]);
        assert!(backend.save(&store).await);

        let loaded = backend.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["s1"].len(), 1);
        assert_eq!(loaded["s1"][0].text, "new");
    }

    #[tokio::test]
    async fn legacy_schema_normalizes_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        std::fs::write(
            &path,
            r#"{"s1": [{"text": "t", "datetime": "2099-03-04 09:00", "repeat": "daily_workday"}]}"#,
        )
        .unwrap();

        let backend = FileBackend::new(path);
        let loaded = backend.load().await;
        let r = &loaded["s1"][0];
        assert_eq!(r.date_time, "2099-03-04 09:00");
        assert_eq!(
            r.repeat_type,
            crate::reminder::types::RepeatKind::Daily
        );
        assert_eq!(
            r.holiday_type,
            Some(crate::reminder::types::HolidayGate::Workday)
        );
    }
}
