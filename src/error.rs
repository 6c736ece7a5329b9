//! User-facing errors at the request boundary.
//!
//! Everything here is safe to render back to the chat user verbatim.
//! Internal failures (calendar fetches, delivery errors) are logged and never
//! surface through this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("invalid repeat type '{0}', expected daily, weekly, monthly, yearly or none")]
    InvalidRepeat(String),

    #[error("invalid holiday type '{0}', expected workday or holiday")]
    InvalidGate(String),

    #[error("invalid weekday '{0}', expected mon, tue, wed, thu, fri, sat or sun")]
    InvalidWeekday(String),

    #[error("no reminder or task at index {0}")]
    InvalidIndex(usize),

    #[error("there are no reminders or tasks for this session")]
    Empty,

    #[error("failed to schedule the job")]
    ScheduleFailed,

    #[error("could not save reminder data")]
    SaveFailed,
}
