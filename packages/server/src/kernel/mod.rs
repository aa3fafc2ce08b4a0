//! Kernel module - server infrastructure and dependencies.

pub mod deferred;
pub mod deps;
pub mod pg_store;
pub mod sendgrid;
pub mod test_dependencies;
pub mod traits;

pub use deferred::DeferredTaskQueue;
pub use deps::{ServerDeps, UnreadCheckSettings};
pub use pg_store::PgStore;
pub use sendgrid::{NoopEmailService, SendGridClient};
pub use test_dependencies::{FailingActivityLogger, InMemoryStore, MockEmailService};
pub use traits::*;
