//! Reminder data model, input parsing and the create/delete/list operations.

pub mod ops;
pub mod parse;
pub mod types;
