//! Trigger shapes: compiling a recurrence description into cron fields.
//!
//! The whole (repeat kind, holiday gate) matrix reduces to one data table:
//! cron-like fields derived from the anchor plus a gate predicate evaluated
//! at fire time. The gate is orthogonal to the cadence — "every workday" is a
//! daily cadence filtered at fire time, not a calendar-driven schedule,
//! because holiday tables for future years may not exist yet at registration
//! time.

use chrono::{Datelike, Local, NaiveDateTime, TimeZone, Timelike, Weekday};
use std::str::FromStr;

use crate::reminder::types::{HolidayGate, ReminderRecord, RepeatKind};

/// Gate predicate evaluated against the holiday calendar before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireGate {
    Always,
    WorkdayOnly,
    HolidayOnly,
}

/// Cron fields for a recurring cadence. `None` fields are wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronFields {
    pub minute: u32,
    pub hour: u32,
    pub day: Option<u32>,
    pub month: Option<u32>,
    pub weekday: Option<Weekday>,
}

impl CronFields {
    /// Render as a 7-field cron expression (sec min hour dom month dow year).
    pub fn to_expr(&self) -> String {
        fn num(f: Option<u32>) -> String {
            f.map_or_else(|| "*".to_string(), |v| v.to_string())
        }
        let dow = self.weekday.map_or("*", weekday_name);
        format!(
            "0 {} {} {} {} {} *",
            self.minute,
            self.hour,
            num(self.day),
            num(self.month),
            dow
        )
    }
}

fn weekday_name(w: Weekday) -> &'static str {
    match w {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}

/// Compiled trigger for one record: a single shot at the anchor, or a cron
/// cadence plus a fire-time gate.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerShape {
    Once { at: NaiveDateTime },
    Cron { expr: String, gate: FireGate },
}

impl TriggerShape {
    pub fn gate(&self) -> FireGate {
        match self {
            // A one-shot fires at its anchor unconditionally.
            TriggerShape::Once { .. } => FireGate::Always,
            TriggerShape::Cron { gate, .. } => *gate,
        }
    }
}

/// Cadence fields derived from the anchor, `None` for one-shot records.
fn cadence_fields(kind: RepeatKind, anchor: NaiveDateTime) -> Option<CronFields> {
    let base = CronFields {
        minute: anchor.minute(),
        hour: anchor.hour(),
        day: None,
        month: None,
        weekday: None,
    };
    match kind {
        RepeatKind::None => None,
        RepeatKind::Daily => Some(base),
        RepeatKind::Weekly => Some(CronFields {
            weekday: Some(anchor.weekday()),
            ..base
        }),
        RepeatKind::Monthly => Some(CronFields {
            day: Some(anchor.day()),
            ..base
        }),
        RepeatKind::Yearly => Some(CronFields {
            day: Some(anchor.day()),
            month: Some(anchor.month()),
            ..base
        }),
    }
}

/// Compile a record into its trigger shape.
pub fn compile(record: &ReminderRecord, anchor: NaiveDateTime) -> TriggerShape {
    match cadence_fields(record.repeat_type, anchor) {
        None => TriggerShape::Once { at: anchor },
        Some(fields) => {
            let gate = match record.holiday_type {
                Some(HolidayGate::Workday) => FireGate::WorkdayOnly,
                Some(HolidayGate::Holiday) => FireGate::HolidayOnly,
                None => FireGate::Always,
            };
            TriggerShape::Cron {
                expr: fields.to_expr(),
                gate,
            }
        }
    }
}

/// Next fire time in local epoch milliseconds, strictly after `after_ms`.
/// `None` for a one-shot whose anchor is already past, or an invalid shape.
pub fn next_run_ms(shape: &TriggerShape, after_ms: i64) -> Option<i64> {
    match shape {
        TriggerShape::Once { at } => {
            let at_ms = Local
                .from_local_datetime(at)
                .earliest()?
                .timestamp_millis();
            (at_ms > after_ms).then_some(at_ms)
        }
        TriggerShape::Cron { expr, .. } => {
            let schedule = cron::Schedule::from_str(expr).ok()?;
            let after = Local.timestamp_millis_opt(after_ms).single()?;
            schedule
                .after(&after)
                .next()
                .map(|dt| dt.timestamp_millis())
        }
    }
}
