//! Recurrence compiler and timed job execution.

pub mod service;
pub mod trigger;

pub use service::ReminderScheduler;
