//! Activity domain - best-effort audit trail of user actions

pub mod actions;
pub mod models;

pub use actions::{activity_history, record_activity};
pub use models::{ActivityEntry, ActivityEvent};
