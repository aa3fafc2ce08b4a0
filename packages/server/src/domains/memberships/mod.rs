//! Memberships domain - the join / approve / reject / leave / remove workflow
//!
//! Architecture:
//!   route → action → (locked transaction: machine decides, store writes) → side effects

pub mod actions;
pub mod error;
pub mod machines;
pub mod models;
pub mod policy;

pub use error::MembershipError;
pub use models::{Membership, MembershipStatus};
pub use policy::MembershipPolicy;
