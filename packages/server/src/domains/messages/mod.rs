//! Messages domain - group chat and the deferred unread-messages check

pub mod actions;
pub mod models;

pub use actions::{list_messages, send_message};
pub use models::Message;
