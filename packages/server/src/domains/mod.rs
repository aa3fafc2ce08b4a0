// Business domains
pub mod accounts;
pub mod activity;
pub mod groups;
pub mod memberships;
pub mod messages;
pub mod notifications;
pub mod reminders;
