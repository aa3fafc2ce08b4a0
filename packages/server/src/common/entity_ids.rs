//! Typed ID definitions for the entities that have surrogate keys.
//!
//! Memberships are keyed by `(GroupId, username)` and accounts by username,
//! so neither has an id type of its own.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for activity groups.
pub struct Group;

/// Marker type for in-app notifications.
pub struct Notification;

/// Marker type for group chat messages.
pub struct Message;

/// Marker type for activity log entries.
pub struct ActivityEntry;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type GroupId = Id<Group>;

pub type NotificationId = Id<Notification>;

pub type MessageId = Id<Message>;

pub type ActivityLogId = Id<ActivityEntry>;
