//! Postgres-backed implementations of the storage traits.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::{
    BaseAccountDirectory, BaseActivityLogger, BaseGroupStore, BaseMessageStore,
    BaseNotificationStore, BaseReminderLog, MembershipTransaction,
};
use crate::common::{GroupId, MessageId, NotificationId};
use crate::domains::accounts::Account;
use crate::domains::activity::models::{ActivityEntry, ActivityEvent};
use crate::domains::groups::models::{Group, GroupFilter};
use crate::domains::memberships::models::{Membership, MembershipStatus};
use crate::domains::messages::models::Message;
use crate::domains::notifications::models::{NewNotification, Notification};
use crate::domains::reminders::models::{ReminderKind, ReminderSent};

/// All persistence over one connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseGroupStore for PgStore {
    async fn create_group(&self, group: &Group) -> Result<Group> {
        group
            .insert_with_organiser(&self.pool)
            .await
            .context("Failed to insert group")
    }

    async fn find_group(&self, id: GroupId) -> Result<Option<Group>> {
        Group::find_by_id(id, &self.pool).await
    }

    async fn list_groups(&self, filter: &GroupFilter) -> Result<Vec<Group>> {
        Group::list(filter, &self.pool).await
    }

    async fn groups_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Group>> {
        Group::starting_between(from, to, &self.pool).await
    }

    async fn delete_group(&self, id: GroupId) -> Result<bool> {
        Group::delete(id, &self.pool).await
    }

    async fn list_memberships(
        &self,
        group_id: GroupId,
        status: Option<MembershipStatus>,
    ) -> Result<Vec<Membership>> {
        match status {
            Some(status) => Membership::list_by_status(group_id, status, &self.pool).await,
            None => Membership::list_for_group(group_id, &self.pool).await,
        }
    }

    async fn begin(&self, group_id: GroupId) -> Result<Option<Box<dyn MembershipTransaction>>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin membership transaction")?;

        let Some(group) = Group::lock_for_update(group_id, &mut *tx).await? else {
            return Ok(None);
        };

        Ok(Some(Box::new(PgMembershipTransaction { tx, group })))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Transaction that holds `SELECT ... FOR UPDATE` on the group row
struct PgMembershipTransaction {
    tx: Transaction<'static, Postgres>,
    group: Group,
}

#[async_trait]
impl MembershipTransaction for PgMembershipTransaction {
    fn group(&self) -> &Group {
        &self.group
    }

    async fn get(&mut self, username: &str) -> Result<Option<Membership>> {
        Membership::find(self.group.id, username, &mut *self.tx).await
    }

    async fn count_by_status(&mut self, status: MembershipStatus) -> Result<i64> {
        Membership::count_by_status(self.group.id, status, &mut *self.tx).await
    }

    async fn upsert(&mut self, membership: &Membership) -> Result<()> {
        Membership::upsert(membership, &mut *self.tx).await
    }

    async fn delete(&mut self, username: &str) -> Result<bool> {
        Membership::delete(self.group.id, username, &mut *self.tx).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit membership transaction")
    }
}

#[async_trait]
impl BaseNotificationStore for PgStore {
    async fn create(&self, notification: NewNotification) -> Result<Notification> {
        Notification::insert(notification, &self.pool).await
    }

    async fn create_unread_messages_if_absent(
        &self,
        recipient: &str,
        group_id: GroupId,
        message: &str,
    ) -> Result<bool> {
        Notification::insert_unread_messages_if_absent(recipient, group_id, message, &self.pool)
            .await
    }

    async fn list_for_recipient(
        &self,
        recipient: &str,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        Notification::list_for_recipient(recipient, unread_only, limit, &self.pool).await
    }

    async fn unread_count(&self, recipient: &str) -> Result<i64> {
        Notification::unread_count(recipient, &self.pool).await
    }

    async fn mark_read(&self, id: NotificationId, recipient: &str) -> Result<bool> {
        Notification::mark_read(id, recipient, &self.pool).await
    }
}

#[async_trait]
impl BaseMessageStore for PgStore {
    async fn insert(&self, message: &Message) -> Result<()> {
        message.insert(&self.pool).await
    }

    async fn list(
        &self,
        group_id: GroupId,
        limit: i64,
        before: Option<MessageId>,
    ) -> Result<Vec<Message>> {
        Message::list(group_id, limit, before, &self.pool).await
    }

    async fn mark_read(&self, ids: &[MessageId], username: &str) -> Result<()> {
        Message::mark_read(ids, username, &self.pool).await
    }

    async fn unread_count(&self, group_id: GroupId, username: &str) -> Result<i64> {
        Message::unread_count(group_id, username, &self.pool).await
    }
}

#[async_trait]
impl BaseActivityLogger for PgStore {
    async fn log(
        &self,
        username: &str,
        event: ActivityEvent,
        group_id: Option<GroupId>,
    ) -> Result<()> {
        ActivityEntry::new(username, event, group_id)
            .insert(&self.pool)
            .await
    }

    async fn history(&self, username: &str, limit: i64) -> Result<Vec<ActivityEntry>> {
        ActivityEntry::history(username, limit, &self.pool).await
    }
}

#[async_trait]
impl BaseReminderLog for PgStore {
    async fn claim(&self, group_id: GroupId, username: &str, kind: ReminderKind) -> Result<bool> {
        ReminderSent::claim(group_id, username, kind, &self.pool).await
    }

    async fn release(&self, group_id: GroupId, username: &str, kind: ReminderKind) -> Result<()> {
        ReminderSent::release(group_id, username, kind, &self.pool).await
    }
}

#[async_trait]
impl BaseAccountDirectory for PgStore {
    async fn email_for(&self, username: &str) -> Result<Option<String>> {
        Ok(Account::find_by_username(username, &self.pool)
            .await?
            .map(|account| account.email))
    }
}
