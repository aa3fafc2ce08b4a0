//! Membership workflow actions
//!
//! Each action runs its state-machine step in a locked transaction, commits,
//! and only then performs side effects (activity log, notifications, email).
//! Side-effect failures are logged and never change the action's result.

mod leave_group;
mod queries;
mod remove_member;
mod request_join;
mod review;
mod transition;

pub use leave_group::leave_group;
pub use queries::{is_approved_member, list_pending_members};
pub use remove_member::remove_member;
pub use request_join::request_join;
pub use review::{approve_member, reject_member};
pub use transition::AppliedTransition;
