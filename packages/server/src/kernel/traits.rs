// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Membership rules live in domains/memberships; these traits only persist and deliver.
//
// Naming convention: Base* for injected services (e.g., BaseGroupStore, BaseEmailService)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{GroupId, MessageId, NotificationId};
use crate::domains::activity::models::{ActivityEntry, ActivityEvent};
use crate::domains::groups::models::{Group, GroupFilter};
use crate::domains::memberships::models::{Membership, MembershipStatus};
use crate::domains::messages::models::Message;
use crate::domains::notifications::models::{NewNotification, Notification};
use crate::domains::reminders::models::ReminderKind;

// =============================================================================
// Group + Membership Store
// =============================================================================

/// Persistence for groups and their membership rows
#[async_trait]
pub trait BaseGroupStore: Send + Sync {
    /// Insert a group together with its organiser's approved membership
    async fn create_group(&self, group: &Group) -> Result<Group>;

    async fn find_group(&self, id: GroupId) -> Result<Option<Group>>;

    async fn list_groups(&self, filter: &GroupFilter) -> Result<Vec<Group>>;

    /// Every group whose event starts in `(from, to]`, soonest first
    async fn groups_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Group>>;

    /// Delete a group and everything that cascades from it
    async fn delete_group(&self, id: GroupId) -> Result<bool>;

    /// Membership rows of a group, optionally restricted to one status
    async fn list_memberships(
        &self,
        group_id: GroupId,
        status: Option<MembershipStatus>,
    ) -> Result<Vec<Membership>>;

    /// Open a transaction holding the group's lock.
    ///
    /// Returns `None` if the group does not exist. All membership reads and
    /// writes for that group made through the returned handle are serialised
    /// against every other transaction on the same group until commit or drop.
    async fn begin(&self, group_id: GroupId) -> Result<Option<Box<dyn MembershipTransaction>>>;

    /// Cheap reachability check for the health endpoint
    async fn ping(&self) -> Result<()>;
}

/// A locked unit of work over one group's memberships.
///
/// Dropping the handle without calling `commit` discards every write.
#[async_trait]
pub trait MembershipTransaction: Send {
    /// The group as read under the lock
    fn group(&self) -> &Group;

    async fn get(&mut self, username: &str) -> Result<Option<Membership>>;

    async fn count_by_status(&mut self, status: MembershipStatus) -> Result<i64>;

    async fn upsert(&mut self, membership: &Membership) -> Result<()>;

    async fn delete(&mut self, username: &str) -> Result<bool>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

// =============================================================================
// Notification Store
// =============================================================================

#[async_trait]
pub trait BaseNotificationStore: Send + Sync {
    async fn create(&self, notification: NewNotification) -> Result<Notification>;

    /// Create an `unread_messages` notification unless an unread one already
    /// exists for the same recipient and group. Returns whether a row was created.
    async fn create_unread_messages_if_absent(
        &self,
        recipient: &str,
        group_id: GroupId,
        message: &str,
    ) -> Result<bool>;

    /// Newest first
    async fn list_for_recipient(
        &self,
        recipient: &str,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>>;

    async fn unread_count(&self, recipient: &str) -> Result<i64>;

    /// Mark one of the recipient's notifications read. `false` if it is not theirs.
    async fn mark_read(&self, id: NotificationId, recipient: &str) -> Result<bool>;
}

// =============================================================================
// Message Store
// =============================================================================

#[async_trait]
pub trait BaseMessageStore: Send + Sync {
    async fn insert(&self, message: &Message) -> Result<()>;

    /// Newest first, optionally strictly older than `before`
    async fn list(
        &self,
        group_id: GroupId,
        limit: i64,
        before: Option<MessageId>,
    ) -> Result<Vec<Message>>;

    /// Add `username` to `read_by` of the given messages
    async fn mark_read(&self, ids: &[MessageId], username: &str) -> Result<()>;

    /// Messages in the group that `username` has not read
    async fn unread_count(&self, group_id: GroupId, username: &str) -> Result<i64>;
}

// =============================================================================
// Activity Logger
// =============================================================================

#[async_trait]
pub trait BaseActivityLogger: Send + Sync {
    async fn log(&self, username: &str, event: ActivityEvent, group_id: Option<GroupId>)
        -> Result<()>;

    /// Newest first
    async fn history(&self, username: &str, limit: i64) -> Result<Vec<ActivityEntry>>;
}

// =============================================================================
// Reminder Log
// =============================================================================

/// Which event reminders have gone out, so each is sent once per member
#[async_trait]
pub trait BaseReminderLog: Send + Sync {
    /// Record the reminder as sent; `false` if it already was
    async fn claim(&self, group_id: GroupId, username: &str, kind: ReminderKind) -> Result<bool>;

    /// Undo a claim whose delivery failed
    async fn release(&self, group_id: GroupId, username: &str, kind: ReminderKind) -> Result<()>;
}

// =============================================================================
// Account Directory
// =============================================================================

#[async_trait]
pub trait BaseAccountDirectory: Send + Sync {
    /// Email address of an account, `None` if the account is unknown
    async fn email_for(&self, username: &str) -> Result<Option<String>>;
}

// =============================================================================
// Email Service (Infrastructure)
// =============================================================================

/// A fully rendered outgoing email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub plain_content: String,
    pub html_content: String,
}

#[async_trait]
pub trait BaseEmailService: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}
