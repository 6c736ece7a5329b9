//! Reminder scheduler — registers triggers and fires due occurrences.
//!
//! One scheduler instance exists per process; the application wiring
//! constructs it once and shares the handle. Each occurrence series owns one
//! live trigger, keyed by a job id derived from (session key, text, anchor) —
//! re-registering the same logical occurrence replaces instead of
//! duplicating, so reloading persisted state is idempotent.

use chrono::{Local, NaiveDate, TimeZone};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::bus::{render_notification, Notifier, OutboundMessage};
use crate::calendar::HolidayCalendar;
use crate::reminder::types::{ReminderRecord, ReminderStore};
use crate::scheduler::trigger::{self, FireGate, TriggerShape};
use crate::session;
use crate::store::ReminderBackend;

/// How often the tick loop checks for due jobs.
const TICK_INTERVAL: Duration = Duration::from_secs(10);

/// Stable job id for one occurrence series.
pub fn job_id(session_key: &str, record: &ReminderRecord) -> String {
    let unique_key = format!("{}_{}_{}", session_key, record.text, record.date_time);
    format!("remind_{:x}", md5::compute(unique_key.as_bytes()))
}

#[derive(Debug, Clone)]
struct Job {
    session_key: String,
    record: ReminderRecord,
    shape: TriggerShape,
    next_run_ms: Option<i64>,
}

pub struct ReminderScheduler {
    jobs: RwLock<HashMap<String, Job>>,
    store: Arc<RwLock<ReminderStore>>,
    backend: Arc<dyn ReminderBackend>,
    calendar: Arc<HolidayCalendar>,
    notifier: Arc<dyn Notifier>,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<RwLock<ReminderStore>>,
        backend: Arc<dyn ReminderBackend>,
        calendar: Arc<HolidayCalendar>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        Arc::new(Self {
            jobs: RwLock::new(HashMap::new()),
            store,
            backend,
            calendar,
            notifier,
        })
    }

    /// Register or replace the trigger for `record`. Returns false when the
    /// record cannot be compiled into a trigger; scheduler-internal problems
    /// never propagate past the boolean.
    pub async fn schedule(&self, session_key: &str, record: &ReminderRecord) -> bool {
        let anchor = match record.anchor() {
            Some(a) => a,
            None => {
                warn!(
                    text = %record.text,
                    date_time = %record.date_time,
                    "cannot schedule record with malformed anchor"
                );
                return false;
            }
        };

        let shape = trigger::compile(record, anchor);
        let now_ms = Local::now().timestamp_millis();
        let next_run_ms = trigger::next_run_ms(&shape, now_ms);

        if next_run_ms.is_none() {
            if let TriggerShape::Once { .. } = shape {
                // Stale one-shots are discarded, never caught up.
                info!(text = %record.text, "one-shot anchor already passed, not scheduling");
                return true;
            }
            warn!(text = %record.text, "trigger has no next occurrence");
            return false;
        }

        let id = job_id(session_key, record);
        let job = Job {
            session_key: session_key.to_string(),
            record: record.clone(),
            shape,
            next_run_ms,
        };
        let replaced = self.jobs.write().await.insert(id.clone(), job).is_some();
        info!(
            job_id = %id,
            text = %record.text,
            repeat = record.repeat_type.as_str(),
            replaced,
            "scheduled reminder"
        );
        true
    }

    /// Remove a live trigger. A lookup miss is an expected soft failure
    /// (double delete), reported as false.
    pub async fn cancel(&self, job_id: &str) -> bool {
        if self.jobs.write().await.remove(job_id).is_some() {
            info!(job_id = %job_id, "removed job");
            true
        } else {
            warn!(job_id = %job_id, "job not found");
            false
        }
    }

    /// Re-submit every persisted record. Called once at startup before any
    /// external traffic; past-dated one-shots are dropped here rather than
    /// fired late.
    pub async fn schedule_all(&self) {
        let snapshot = self.store.read().await.clone();
        let total: usize = snapshot.values().map(Vec::len).sum();
        info!(total, "scheduling persisted reminders");

        for (session_key, records) in &snapshot {
            for record in records {
                if record.is_one_shot() && record.is_outdated() {
                    info!(text = %record.text, date_time = %record.date_time, "skipping expired one-shot");
                    continue;
                }
                if !self.schedule(session_key, record).await {
                    warn!(text = %record.text, "failed to schedule persisted record");
                }
            }
        }
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn has_job(&self, job_id: &str) -> bool {
        self.jobs.read().await.contains_key(job_id)
    }

    /// Fire one job immediately, gated against `today`. Returns false when
    /// the job id is unknown (a stale id after deletion is not an error).
    pub async fn fire_job_at(&self, job_id: &str, today: NaiveDate) -> bool {
        let job = match self.jobs.read().await.get(job_id) {
            Some(j) => j.clone(),
            None => {
                warn!(job_id = %job_id, "fire requested for unknown job");
                return false;
            }
        };
        self.fire(job_id, &job, today).await;
        if let TriggerShape::Once { .. } = job.shape {
            self.jobs.write().await.remove(job_id);
        }
        true
    }

    /// Fire one job immediately against today's calendar.
    pub async fn fire_job(&self, job_id: &str) -> bool {
        self.fire_job_at(job_id, Local::now().date_naive()).await
    }

    /// One pass of the tick loop against the clock reading `now_ms`: fire
    /// everything due, advance each recurring job to its next occurrence and
    /// drop jobs with no occurrence left. Returns the number of due jobs
    /// handled (a gate-skipped occurrence counts as handled).
    pub async fn tick_once(&self, now_ms: i64) -> usize {
        let due: Vec<(String, Job)> = {
            let mut jobs = self.jobs.write().await;
            let mut due = Vec::new();
            let mut finished = Vec::new();
            for (id, job) in jobs.iter_mut() {
                let Some(next) = job.next_run_ms else { continue };
                if now_ms < next {
                    continue;
                }
                due.push((id.clone(), job.clone()));
                job.next_run_ms = trigger::next_run_ms(&job.shape, now_ms);
                if job.next_run_ms.is_none() {
                    finished.push(id.clone());
                }
            }
            for id in finished {
                jobs.remove(&id);
            }
            due
        };

        // Gate against the calendar date of the tick, not of the fire.
        let today = Local
            .timestamp_millis_opt(now_ms)
            .single()
            .map(|dt| dt.date_naive())
            .unwrap_or_else(|| Local::now().date_naive());
        let fired = due.len();
        for (id, job) in due {
            self.fire(&id, &job, today).await;
        }
        fired
    }

    /// Run the tick loop: every 10 seconds fire whatever came due and advance
    /// each recurring job to its next occurrence. One-shots leave the job
    /// table after firing.
    pub async fn run(self: Arc<Self>) {
        info!("reminder scheduler started");
        let mut interval = tokio::time::interval(TICK_INTERVAL);
        loop {
            interval.tick().await;
            self.tick_once(Local::now().timestamp_millis()).await;
        }
    }

    /// Fire-time path: consult the gate, deliver exactly once to the raw
    /// session, and retire fired one-shots from the store.
    async fn fire(&self, job_id: &str, job: &Job, today: NaiveDate) {
        match job.shape.gate() {
            FireGate::WorkdayOnly => {
                if !self.calendar.is_workday(today).await {
                    info!(job_id = %job_id, date = %today, "not a workday, skipping occurrence");
                    return;
                }
            }
            FireGate::HolidayOnly => {
                if !self.calendar.is_holiday(today).await {
                    info!(job_id = %job_id, date = %today, "not a holiday, skipping occurrence");
                    return;
                }
            }
            FireGate::Always => {}
        }

        // Delivery always targets the raw chat, never the isolated key.
        let target = session::deisolate(&job.session_key);
        let message = OutboundMessage {
            session_key: target,
            content: render_notification(&job.record),
            is_task: job.record.is_task,
            timestamp: chrono::Utc::now(),
        };
        debug!(job_id = %job_id, session = %message.session_key, "delivering occurrence");
        if let Err(e) = self.notifier.deliver(message).await {
            // A failed delivery must not break future recurrences; the
            // occurrence counts as attempted.
            error!(job_id = %job_id, error = %e, "delivery failed");
        }

        if job.record.is_one_shot() {
            self.retire_one_shot(&job.session_key, &job.record).await;
        }
    }

    /// Remove a fired one-shot from the store and persist. The only mutation
    /// that happens outside an explicit user request.
    async fn retire_one_shot(&self, session_key: &str, record: &ReminderRecord) {
        let mut store = self.store.write().await;
        if let Some(records) = store.get_mut(session_key) {
            records.retain(|r| !(r.is_one_shot() && r.same_occurrence(record)));
            if records.is_empty() {
                store.remove(session_key);
            }
        }
        info!(text = %record.text, "removed fired one-shot");
        if !self.backend.save(&store).await {
            error!("failed to persist store after one-shot fired");
        }
    }
}
