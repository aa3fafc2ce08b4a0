//! Account directory used to address outgoing email

pub mod models;

pub use models::Account;
