//! Notifications domain - in-app notifications and membership emails

pub mod actions;
pub mod emails;
pub mod models;

pub use actions::{notify, send_membership_email};
pub use emails::{event_reminder, MembershipEmail};
pub use models::{NewNotification, Notification, NotificationType};
