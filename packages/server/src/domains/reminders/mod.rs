//! Reminders domain - emails to approved members before an event starts

pub mod actions;
pub mod models;
pub mod worker;

pub use actions::send_due_reminders;
pub use models::ReminderKind;
pub use worker::{ReminderSettings, ReminderWorker};
