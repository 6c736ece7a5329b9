//! Reminder data types.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Wire format of the anchor timestamp, local wall-clock.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepeatKind {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RepeatKind {
    /// Parse a repeat kind string. Unknown values map to `None` (one-shot),
    /// which is how legacy records with free-form repeat strings behaved.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "daily" => RepeatKind::Daily,
            "weekly" => RepeatKind::Weekly,
            "monthly" => RepeatKind::Monthly,
            "yearly" => RepeatKind::Yearly,
            _ => RepeatKind::None,
        }
    }

    pub fn is_known(s: &str) -> bool {
        matches!(
            s.to_lowercase().as_str(),
            "daily" | "weekly" | "monthly" | "yearly" | "none"
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatKind::None => "none",
            RepeatKind::Daily => "daily",
            RepeatKind::Weekly => "weekly",
            RepeatKind::Monthly => "monthly",
            RepeatKind::Yearly => "yearly",
        }
    }
}

/// Fire-time restriction consulted against the holiday calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayGate {
    /// Execute only on workdays.
    Workday,
    /// Execute only on legal holidays.
    Holiday,
}

impl HolidayGate {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "workday" => Some(HolidayGate::Workday),
            "holiday" => Some(HolidayGate::Holiday),
            _ => None,
        }
    }
}

/// One scheduled occurrence definition.
///
/// For scheduling purposes a record is identified by the tuple
/// (session key, `text`, `date_time`); that tuple is stable across reloads so
/// recompiling trigger state replaces rather than duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordCompat")]
pub struct ReminderRecord {
    pub text: String,
    /// Anchor occurrence, `YYYY-MM-DD HH:MM` local time.
    pub date_time: String,
    pub user_name: Option<String>,
    pub repeat_type: RepeatKind,
    pub holiday_type: Option<HolidayGate>,
    pub creator_id: Option<String>,
    pub creator_name: Option<String>,
    pub is_task: bool,
}

impl ReminderRecord {
    pub fn anchor(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date_time, DATE_TIME_FORMAT).ok()
    }

    pub fn is_one_shot(&self) -> bool {
        self.repeat_type == RepeatKind::None
    }

    /// True when the anchor is already in the past. A malformed anchor is
    /// logged and treated as not outdated so the record survives for
    /// inspection instead of being silently pruned.
    pub fn is_outdated(&self) -> bool {
        match self.anchor() {
            Some(anchor) => anchor <= Local::now().naive_local(),
            None => {
                warn!(text = %self.text, date_time = %self.date_time, "record has malformed date_time");
                false
            }
        }
    }

    /// Identity-tuple match used for removal after a fired occurrence.
    pub fn same_occurrence(&self, other: &ReminderRecord) -> bool {
        self.text.trim() == other.text.trim()
            && self.date_time.trim() == other.date_time.trim()
            && self.creator_id == other.creator_id
    }
}

/// Historical schema adapter. Two older spellings are normalized on load:
/// `datetime` for `date_time`, and a compound `repeat` field
/// (`"daily_workday"`) instead of `repeat_type` + `holiday_type`.
#[derive(Debug, Deserialize)]
struct RecordCompat {
    #[serde(default)]
    text: String,
    #[serde(default, alias = "datetime")]
    date_time: String,
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    repeat_type: Option<String>,
    #[serde(default)]
    holiday_type: Option<String>,
    #[serde(default)]
    repeat: Option<String>,
    #[serde(default)]
    creator_id: Option<String>,
    #[serde(default)]
    creator_name: Option<String>,
    #[serde(default)]
    is_task: bool,
}

impl From<RecordCompat> for ReminderRecord {
    fn from(raw: RecordCompat) -> Self {
        let (kind, gate) = match (raw.repeat_type, raw.repeat) {
            (Some(kind), _) => (kind, raw.holiday_type),
            (None, Some(compound)) => match compound.split_once('_') {
                Some((kind, gate)) => (kind.to_string(), Some(gate.to_string())),
                None => (compound, raw.holiday_type),
            },
            (None, None) => ("none".to_string(), raw.holiday_type),
        };
        ReminderRecord {
            text: raw.text,
            date_time: raw.date_time,
            user_name: raw.user_name,
            repeat_type: RepeatKind::parse(&kind),
            holiday_type: gate.as_deref().and_then(HolidayGate::parse),
            creator_id: raw.creator_id,
            creator_name: raw.creator_name,
            is_task: raw.is_task,
        }
    }
}

/// In-memory reminder set: session key to ordered record list. A sorted map
/// keeps display indexes deterministic across loads.
pub type ReminderStore = BTreeMap<String, Vec<ReminderRecord>>;

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date_time: &str, kind: RepeatKind) -> ReminderRecord {
        ReminderRecord {
            text: "meeting".into(),
            date_time: date_time.into(),
            user_name: None,
            repeat_type: kind,
            holiday_type: None,
            creator_id: Some("u1".into()),
            creator_name: Some("User".into()),
            is_task: false,
        }
    }

    #[test]
    fn past_anchor_is_outdated() {
        assert!(record("2000-01-01 08:00", RepeatKind::None).is_outdated());
    }

    #[test]
    fn future_anchor_is_not_outdated() {
        assert!(!record("2099-01-01 08:00", RepeatKind::None).is_outdated());
    }

    #[test]
    fn malformed_anchor_is_not_outdated() {
        assert!(!record("soonish", RepeatKind::None).is_outdated());
    }

    #[test]
    fn canonical_fields_deserialize() {
        let json = r#"{
            "text": "standup",
            "date_time": "2024-03-04 09:00",
            "user_name": "u1",
            "repeat_type": "weekly",
            "holiday_type": "workday",
            "creator_id": "u1",
            "creator_name": "User",
            "is_task": false
        }"#;
        let r: ReminderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.repeat_type, RepeatKind::Weekly);
        assert_eq!(r.holiday_type, Some(HolidayGate::Workday));
        assert_eq!(r.date_time, "2024-03-04 09:00");
    }

    #[test]
    fn legacy_compound_repeat_normalizes() {
        let json = r#"{"text": "t", "datetime": "2024-03-04 09:00", "repeat": "daily_workday"}"#;
        let r: ReminderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.repeat_type, RepeatKind::Daily);
        assert_eq!(r.holiday_type, Some(HolidayGate::Workday));
        assert_eq!(r.date_time, "2024-03-04 09:00");
    }

    #[test]
    fn legacy_simple_repeat_normalizes() {
        let json = r#"{"text": "t", "datetime": "2024-03-04 09:00", "repeat": "weekly"}"#;
        let r: ReminderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.repeat_type, RepeatKind::Weekly);
        assert_eq!(r.holiday_type, None);
    }

    #[test]
    fn unknown_repeat_maps_to_one_shot() {
        let json = r#"{"text": "t", "date_time": "2024-03-04 09:00", "repeat_type": "fortnightly"}"#;
        let r: ReminderRecord = serde_json::from_str(json).unwrap();
        assert!(r.is_one_shot());
    }

    #[test]
    fn serializes_canonical_shape() {
        let r = record("2024-03-04 09:00", RepeatKind::Daily);
        let v: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert!(v.get("date_time").is_some());
        assert!(v.get("datetime").is_none());
        assert!(v.get("repeat").is_none());
        assert_eq!(v["repeat_type"], "daily");
    }
}
