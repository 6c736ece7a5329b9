//! Reminder persistence.
//!
//! Exactly one backend is active per process, selected from the store URL at
//! startup: `sqlite://<path>` opens the relational store, anything else is a
//! flat JSON file. Callers only see [`ReminderBackend`].

pub mod file;
#[cfg(feature = "sqlite-store")]
pub mod sqlite;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::reminder::types::ReminderStore;

#[async_trait]
pub trait ReminderBackend: Send + Sync {
    /// Load the full reminder set. Any failure degrades to an empty store;
    /// startup must not be blocked by a bad file.
    async fn load(&self) -> ReminderStore;

    /// Persist the full reminder set, pruning expired one-shots and empty
    /// session keys from the persisted copy. Returns false on failure, which
    /// callers surface to the user.
    async fn save(&self, store: &ReminderStore) -> bool;
}

/// Drop expired one-shot records and session keys left empty. Applied to the
/// persisted copy on every save so fired-but-undeleted entries cannot
/// accumulate.
pub(crate) fn prune_expired(store: &mut ReminderStore) {
    store.retain(|_, records| {
        records.retain(|r| !r.date_time.is_empty() && !(r.is_one_shot() && r.is_outdated()));
        !records.is_empty()
    });
}

/// Open the backend named by a store URL.
pub fn open_backend(url: &str) -> anyhow::Result<Arc<dyn ReminderBackend>> {
    if let Some(path) = url.strip_prefix("sqlite://") {
        #[cfg(feature = "sqlite-store")]
        {
            return Ok(Arc::new(sqlite::SqliteBackend::open(PathBuf::from(path))?));
        }
        #[cfg(not(feature = "sqlite-store"))]
        {
            let _ = path;
            anyhow::bail!("store url '{url}' requires the sqlite-store feature");
        }
    }
    Ok(Arc::new(file::FileBackend::new(PathBuf::from(url))))
}
