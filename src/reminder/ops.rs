//! Create / delete / list operations over the reminder store.
//!
//! Each request resolves its session key, mutates the shared store under a
//! write lock for the whole read-modify-persist sequence, keeps the live
//! trigger set in step with the store, and persists before answering.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::error::RequestError;
use crate::reminder::parse::{describe_repeat, parse_datetime, parse_repeat};
use crate::reminder::types::{ReminderRecord, ReminderStore};
use crate::scheduler::service::job_id;
use crate::scheduler::ReminderScheduler;
use crate::session;
use crate::store::ReminderBackend;

/// Who is making the request.
#[derive(Debug, Clone)]
pub struct Requester {
    pub id: String,
    pub name: String,
}

/// What to create: notify the user (reminder) or have the assistant execute
/// an instruction (task).
#[derive(Debug, Clone)]
pub struct CreateRequest<'a> {
    pub text: &'a str,
    pub date_time: &'a str,
    /// Optional weekday name ("mon".."sun") for bare-clock times.
    pub week: Option<&'a str>,
    pub repeat: Option<&'a str>,
    pub holiday_gate: Option<&'a str>,
    pub is_task: bool,
}

pub struct ReminderOps {
    store: Arc<RwLock<ReminderStore>>,
    backend: Arc<dyn ReminderBackend>,
    scheduler: Arc<ReminderScheduler>,
    unique_session: bool,
}

impl ReminderOps {
    pub fn new(
        store: Arc<RwLock<ReminderStore>>,
        backend: Arc<dyn ReminderBackend>,
        scheduler: Arc<ReminderScheduler>,
        unique_session: bool,
    ) -> Self {
        Self {
            store,
            backend,
            scheduler,
            unique_session,
        }
    }

    /// Create a reminder or task and register its trigger.
    ///
    /// A failed trigger registration still persists the record so the next
    /// startup reconciliation can retry; only the persisted-or-not outcome is
    /// allowed to lose data.
    pub async fn create(
        &self,
        raw_origin: &str,
        requester: &Requester,
        request: CreateRequest<'_>,
    ) -> Result<String, RequestError> {
        let (repeat_type, holiday_type) = parse_repeat(request.repeat, request.holiday_gate)?;
        let date_time = parse_datetime(request.date_time, request.week)?;
        let session_key = session::isolate(raw_origin, &requester.id, self.unique_session);

        let record = ReminderRecord {
            text: request.text.to_string(),
            date_time: date_time.clone(),
            user_name: Some(requester.id.clone()),
            repeat_type,
            holiday_type,
            creator_id: Some(requester.id.clone()),
            creator_name: Some(requester.name.clone()),
            is_task: request.is_task,
        };

        let mut store = self.store.write().await;
        store
            .entry(session_key.clone())
            .or_default()
            .push(record.clone());

        let scheduled = self.scheduler.schedule(&session_key, &record).await;
        if !scheduled {
            warn!(text = %record.text, "trigger registration failed, record kept for retry");
        }
        if !self.backend.save(&store).await {
            error!(session = %session_key, "failed to persist after create");
            return Err(RequestError::SaveFailed);
        }
        drop(store);

        if !scheduled {
            return Err(RequestError::ScheduleFailed);
        }

        let noun = if request.is_task { "task" } else { "reminder" };
        info!(session = %session_key, noun, text = %record.text, "created");
        Ok(format!(
            "Set {} \"{}\" for {} ({})",
            noun,
            record.text,
            record.date_time,
            describe_repeat(repeat_type, holiday_type)
        ))
    }

    /// Records visible to this requester: their isolated keys plus the shared
    /// key, in deterministic display order. Index arguments to [`delete`] are
    /// 1-based positions in this list.
    pub async fn list(&self, raw_origin: &str, requester: &Requester) -> Vec<ReminderRecord> {
        let session_key = session::isolate(raw_origin, &requester.id, self.unique_session);
        let store = self.store.read().await;
        visible_records(&store, &session_key, &requester.id)
            .into_iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Delete by 1-based display index, cancelling the live trigger. A
    /// trigger lookup miss is non-fatal (the store stays authoritative).
    pub async fn delete(
        &self,
        raw_origin: &str,
        requester: &Requester,
        index: usize,
    ) -> Result<String, RequestError> {
        let session_key = session::isolate(raw_origin, &requester.id, self.unique_session);

        let mut store = self.store.write().await;
        // Re-read the persisted set so a delete issued right after an external
        // mutation sees current indexes.
        *store = self.backend.load().await;

        let visible: Vec<(String, ReminderRecord)> = {
            let pairs = visible_records(&store, &session_key, &requester.id);
            pairs
                .into_iter()
                .map(|(k, r)| (k.to_string(), r.clone()))
                .collect()
        };
        if visible.is_empty() {
            return Err(RequestError::Empty);
        }
        if index == 0 || index > visible.len() {
            return Err(RequestError::InvalidIndex(index));
        }
        let (owner_key, target) = visible[index - 1].clone();

        if let Some(records) = store.get_mut(&owner_key) {
            if let Some(pos) = records.iter().position(|r| {
                r.text == target.text && r.date_time == target.date_time
            }) {
                records.remove(pos);
            }
            if records.is_empty() {
                store.remove(&owner_key);
            }
        }

        let id = job_id(&owner_key, &target);
        if !self.scheduler.cancel(&id).await {
            warn!(job_id = %id, "no live trigger for deleted record");
        }

        if !self.backend.save(&store).await {
            error!(session = %owner_key, "failed to persist after delete");
            return Err(RequestError::SaveFailed);
        }
        drop(store);

        let noun = if target.is_task { "task" } else { "reminder" };
        info!(session = %owner_key, noun, text = %target.text, "deleted");
        Ok(format!("Deleted {}: {}", noun, target.text))
    }
}

/// All records a requester can see: entries under their isolated keys
/// (suffix `_<creator>`) plus the resolved session key itself.
fn visible_records<'a>(
    store: &'a ReminderStore,
    session_key: &str,
    creator_id: &str,
) -> Vec<(&'a str, &'a ReminderRecord)> {
    let creator_suffix = format!("_{}", creator_id);
    let mut out = Vec::new();
    for (key, records) in store {
        if key == session_key || key.ends_with(&creator_suffix) {
            out.extend(records.iter().map(|r| (key.as_str(), r)));
        }
    }
    out
}
