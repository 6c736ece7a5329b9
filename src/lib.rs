//! # remindbot — chat-session reminder and task scheduler
//!
//! remindbot lets users (and an AI assistant acting on their behalf) schedule
//! one-off or recurring reminders and tasks against a chat session, and
//! guarantees each fires exactly once per occurrence at the right wall-clock
//! moment.
//!
//! ## Modules
//!
//! - [`scheduler`] - Recurrence compiler and timed job execution
//! - [`calendar`] - Holiday/workday calendar consulted at fire time
//! - [`session`] - Session-key isolation and its platform-aware inverse
//! - [`store`] - Reminder persistence (flat-file JSON or SQLite)
//! - [`reminder`] - Data model, time parsing, create/delete/list operations
//! - [`bus`] - Delivery seam between the scheduler and chat transports
//! - [`config`] - JSON configuration with defaults
//!
//! ## Recurrence model
//!
//! A reminder carries a repeat kind (`none`, `daily`, `weekly`, `monthly`,
//! `yearly`) and an optional holiday gate (`workday`, `holiday`). The gate is
//! orthogonal to the cadence: "every workday" is a daily cadence whose gate is
//! evaluated against the holiday calendar at fire time, so future years whose
//! holiday tables are not yet published still schedule correctly.

pub mod bus;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod reminder;
pub mod scheduler;
pub mod session;
pub mod store;
