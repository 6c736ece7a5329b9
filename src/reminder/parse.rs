//! Time and recurrence input parsing.
//!
//! Accepts the shapes users actually type: a full `YYYY-MM-DD HH:MM`, a bare
//! clock (`8:05` or `0805`) anchored to the next matching moment, and an
//! optional weekday name that rolls the anchor to the next such weekday. All
//! failures are validation errors meant for the chat user.

use chrono::{Datelike, Duration, Local, NaiveDateTime, Timelike};
use tracing::info;

use crate::error::RequestError;
use crate::reminder::types::{HolidayGate, RepeatKind, DATE_TIME_FORMAT};

fn weekday_index(name: &str) -> Option<u32> {
    // Monday = 0, matching chrono's num_days_from_monday.
    match name.to_lowercase().as_str() {
        "mon" => Some(0),
        "tue" => Some(1),
        "wed" => Some(2),
        "thu" => Some(3),
        "fri" => Some(4),
        "sat" => Some(5),
        "sun" => Some(6),
        _ => None,
    }
}

fn parse_clock(input: &str) -> Result<(u32, u32), RequestError> {
    let parsed = match input.split_once(':') {
        Some((h, m)) => h
            .trim()
            .parse::<u32>()
            .ok()
            .zip(m.trim().parse::<u32>().ok()),
        None if input.len() == 4 && input.bytes().all(|b| b.is_ascii_digit()) => input[..2]
            .parse::<u32>()
            .ok()
            .zip(input[2..].parse::<u32>().ok()),
        None => None,
    };
    let (hour, minute) = parsed.ok_or_else(|| {
        RequestError::InvalidTime(format!(
            "'{}', expected HH:MM (like 8:05) or HHMM (like 0805)",
            input
        ))
    })?;
    if hour > 23 || minute > 59 {
        return Err(RequestError::InvalidTime(format!(
            "'{}' is out of range",
            input
        )));
    }
    Ok((hour, minute))
}

/// Resolve user time input to a concrete `YYYY-MM-DD HH:MM` anchor.
///
/// A full datetime passes through (re-rendered in canonical form). A bare
/// clock is anchored to today; with a weekday name it rolls to the next such
/// weekday, otherwise a time already past rolls to tomorrow — the result is
/// never in the past.
pub fn parse_datetime(input: &str, week: Option<&str>) -> Result<String, RequestError> {
    let input = input.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(input, DATE_TIME_FORMAT) {
        return Ok(dt.format(DATE_TIME_FORMAT).to_string());
    }

    let (hour, minute) = parse_clock(input)?;
    let now = Local::now().naive_local();
    let mut dt = now
        .with_hour(hour)
        .and_then(|d| d.with_minute(minute))
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .ok_or_else(|| RequestError::InvalidTime(format!("'{}'", input)))?;

    if let Some(week) = week {
        let target = weekday_index(week)
            .ok_or_else(|| RequestError::InvalidWeekday(week.to_string()))?;
        let current = dt.weekday().num_days_from_monday();
        let mut days_ahead = target as i64 - current as i64;
        if days_ahead <= 0 {
            days_ahead += 7;
        }
        dt += Duration::days(days_ahead);
    } else if dt <= now {
        dt += Duration::days(1);
        info!(anchor = %dt.format(DATE_TIME_FORMAT), "requested time already passed, rolled to tomorrow");
    }

    Ok(dt.format(DATE_TIME_FORMAT).to_string())
}

/// Validate and normalize the repeat/gate pair.
///
/// A compound first argument (`"weekly workday"`) splits into kind + gate,
/// which is how tool-calling models tend to pass it.
pub fn parse_repeat(
    repeat: Option<&str>,
    gate: Option<&str>,
) -> Result<(RepeatKind, Option<HolidayGate>), RequestError> {
    let mut repeat = repeat.map(str::trim).filter(|s| !s.is_empty());
    let mut gate = gate.map(str::trim).filter(|s| !s.is_empty());

    if let Some(r) = repeat {
        let parts: Vec<&str> = r.split_whitespace().collect();
        if parts.len() == 2 && HolidayGate::parse(parts[1]).is_some() {
            repeat = Some(parts[0]);
            gate = Some(parts[1]);
        }
    }

    let kind = match repeat {
        Some(r) if !RepeatKind::is_known(r) => {
            return Err(RequestError::InvalidRepeat(r.to_string()))
        }
        Some(r) => RepeatKind::parse(r),
        None => RepeatKind::None,
    };

    let gate = match gate {
        Some(g) => Some(HolidayGate::parse(g).ok_or_else(|| RequestError::InvalidGate(g.to_string()))?),
        None => None,
    };

    Ok((kind, gate))
}

/// Human description of a repeat/gate combination for confirmation messages.
pub fn describe_repeat(kind: RepeatKind, gate: Option<HolidayGate>) -> &'static str {
    match (kind, gate) {
        (RepeatKind::None, _) => "one-off",
        (RepeatKind::Daily, None) => "repeats daily",
        (RepeatKind::Daily, Some(HolidayGate::Workday)) => "repeats every workday",
        (RepeatKind::Daily, Some(HolidayGate::Holiday)) => "repeats every legal holiday",
        (RepeatKind::Weekly, None) => "repeats weekly",
        (RepeatKind::Weekly, Some(HolidayGate::Workday)) => "repeats weekly, workdays only",
        (RepeatKind::Weekly, Some(HolidayGate::Holiday)) => "repeats weekly, holidays only",
        (RepeatKind::Monthly, None) => "repeats monthly",
        (RepeatKind::Monthly, Some(HolidayGate::Workday)) => "repeats monthly, workdays only",
        (RepeatKind::Monthly, Some(HolidayGate::Holiday)) => "repeats monthly, holidays only",
        (RepeatKind::Yearly, None) => "repeats yearly",
        (RepeatKind::Yearly, Some(HolidayGate::Workday)) => "repeats yearly, workdays only",
        (RepeatKind::Yearly, Some(HolidayGate::Holiday)) => "repeats yearly, holidays only",
    }
}
