// Common test utilities

pub mod api;
pub mod fixtures;
pub mod harness;
pub mod postgres;

pub use api::*;
pub use fixtures::*;
pub use harness::*;
pub use postgres::*;
