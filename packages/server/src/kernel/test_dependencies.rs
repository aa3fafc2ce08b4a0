// TestDependencies - in-memory implementations for testing
//
// Provides stores and services that can be injected into ServerDeps so the
// full router runs without Postgres or SendGrid.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    BaseAccountDirectory, BaseActivityLogger, BaseEmailService, BaseGroupStore, BaseMessageStore,
    BaseNotificationStore, BaseReminderLog, EmailMessage, MembershipTransaction,
};
use crate::common::{GroupId, MessageId, NotificationId};
use crate::domains::activity::models::{ActivityEntry, ActivityEvent};
use crate::domains::groups::models::{Group, GroupFilter};
use crate::domains::memberships::models::{Membership, MembershipStatus};
use crate::domains::messages::models::Message;
use crate::domains::notifications::models::{NewNotification, Notification, NotificationType};
use crate::domains::reminders::models::ReminderKind;

// =============================================================================
// In-Memory Store
// =============================================================================

#[derive(Default)]
struct StoreState {
    groups: HashMap<GroupId, Group>,
    memberships: BTreeMap<(GroupId, String), Membership>,
    notifications: Vec<Notification>,
    messages: Vec<Message>,
    activity: Vec<ActivityEntry>,
    accounts: HashMap<String, String>,
    reminders: HashSet<(GroupId, String, ReminderKind)>,
}

impl StoreState {
    fn memberships_of(&self, group_id: GroupId) -> impl Iterator<Item = &Membership> {
        self.memberships
            .values()
            .filter(move |m| m.group_id == group_id)
    }
}

/// Every store trait over one mutex-guarded state.
///
/// A membership transaction holds the mutex until it commits or is dropped,
/// which serialises it against all other store access, the same guarantee
/// the Postgres row lock gives per group.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account so emails to `username` can be addressed
    pub async fn with_account(self, username: &str, email: &str) -> Self {
        self.state
            .lock()
            .await
            .accounts
            .insert(username.to_string(), email.to_string());
        self
    }

    pub async fn add_account(&self, username: &str, email: &str) {
        self.state
            .lock()
            .await
            .accounts
            .insert(username.to_string(), email.to_string());
    }

    /// Write a membership row directly, bypassing the workflow
    pub async fn put_membership(&self, membership: Membership) {
        self.state
            .lock()
            .await
            .memberships
            .insert((membership.group_id, membership.username.clone()), membership);
    }

    pub async fn membership(&self, group_id: GroupId, username: &str) -> Option<Membership> {
        self.state
            .lock()
            .await
            .memberships
            .get(&(group_id, username.to_string()))
            .cloned()
    }

    pub async fn memberships(&self, group_id: GroupId) -> Vec<Membership> {
        self.state
            .lock()
            .await
            .memberships_of(group_id)
            .cloned()
            .collect()
    }

    pub async fn approved_count(&self, group_id: GroupId) -> usize {
        self.state
            .lock()
            .await
            .memberships_of(group_id)
            .filter(|m| m.status == MembershipStatus::Approved)
            .count()
    }

    /// All notifications for a recipient, oldest first
    pub async fn notifications_for(&self, recipient: &str) -> Vec<Notification> {
        self.state
            .lock()
            .await
            .notifications
            .iter()
            .filter(|n| n.recipient_username == recipient)
            .cloned()
            .collect()
    }

    pub async fn notifications_of_type(
        &self,
        recipient: &str,
        notification_type: NotificationType,
    ) -> Vec<Notification> {
        self.notifications_for(recipient)
            .await
            .into_iter()
            .filter(|n| n.notification_type == notification_type)
            .collect()
    }

    pub async fn reminder_sent(&self, group_id: GroupId, username: &str, kind: ReminderKind) -> bool {
        self.state
            .lock()
            .await
            .reminders
            .contains(&(group_id, username.to_string(), kind))
    }

    pub async fn activity_for(&self, username: &str) -> Vec<ActivityEvent> {
        self.state
            .lock()
            .await
            .activity
            .iter()
            .filter(|e| e.username == username)
            .map(|e| e.event_type)
            .collect()
    }
}

#[async_trait]
impl BaseGroupStore for InMemoryStore {
    async fn create_group(&self, group: &Group) -> Result<Group> {
        let mut state = self.state.lock().await;
        if state.groups.contains_key(&group.id) {
            anyhow::bail!("duplicate group id {}", group.id);
        }

        let membership = group.organiser_membership();
        state
            .memberships
            .insert((group.id, membership.username.clone()), membership);
        state.groups.insert(group.id, group.clone());

        Ok(group.clone())
    }

    async fn find_group(&self, id: GroupId) -> Result<Option<Group>> {
        Ok(self.state.lock().await.groups.get(&id).cloned())
    }

    async fn list_groups(&self, filter: &GroupFilter) -> Result<Vec<Group>> {
        let state = self.state.lock().await;
        let mut groups: Vec<Group> = state
            .groups
            .values()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect();
        groups.sort_by(|a, b| filter.compare(a, b));

        Ok(groups
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect())
    }

    async fn groups_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Group>> {
        let state = self.state.lock().await;
        let mut groups: Vec<Group> = state
            .groups
            .values()
            .filter(|g| g.date_time > from && g.date_time <= to)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.date_time.cmp(&b.date_time).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn delete_group(&self, id: GroupId) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.groups.remove(&id).is_none() {
            return Ok(false);
        }

        state.reminders.retain(|(group_id, _, _)| *group_id != id);
        state.memberships.retain(|(group_id, _), _| *group_id != id);
        state.notifications.retain(|n| n.group_id != Some(id));
        state.messages.retain(|m| m.group_id != id);

        Ok(true)
    }

    async fn list_memberships(
        &self,
        group_id: GroupId,
        status: Option<MembershipStatus>,
    ) -> Result<Vec<Membership>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Membership> = state
            .memberships_of(group_id)
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.username.cmp(&b.username))
        });

        Ok(rows)
    }

    async fn begin(&self, group_id: GroupId) -> Result<Option<Box<dyn MembershipTransaction>>> {
        let guard = self.state.clone().lock_owned().await;

        let Some(group) = guard.groups.get(&group_id).cloned() else {
            return Ok(None);
        };

        Ok(Some(Box::new(InMemoryTransaction {
            guard,
            group,
            staged: HashMap::new(),
        })))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Staged writes over a held store lock; applied on commit, discarded on drop
struct InMemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    group: Group,
    staged: HashMap<String, Option<Membership>>,
}

impl InMemoryTransaction {
    fn current(&self, username: &str) -> Option<Membership> {
        match self.staged.get(username) {
            Some(staged) => staged.clone(),
            None => self
                .guard
                .memberships
                .get(&(self.group.id, username.to_string()))
                .cloned(),
        }
    }
}

#[async_trait]
impl MembershipTransaction for InMemoryTransaction {
    fn group(&self) -> &Group {
        &self.group
    }

    async fn get(&mut self, username: &str) -> Result<Option<Membership>> {
        Ok(self.current(username))
    }

    async fn count_by_status(&mut self, status: MembershipStatus) -> Result<i64> {
        let committed = self
            .guard
            .memberships_of(self.group.id)
            .filter(|m| !self.staged.contains_key(&m.username) && m.status == status)
            .count();
        let staged = self
            .staged
            .values()
            .flatten()
            .filter(|m| m.status == status)
            .count();

        Ok((committed + staged) as i64)
    }

    async fn upsert(&mut self, membership: &Membership) -> Result<()> {
        self.staged
            .insert(membership.username.clone(), Some(membership.clone()));
        Ok(())
    }

    async fn delete(&mut self, username: &str) -> Result<bool> {
        let existed = self.current(username).is_some();
        self.staged.insert(username.to_string(), None);
        Ok(existed)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction {
            mut guard,
            group,
            staged,
        } = *self;

        for (username, row) in staged {
            let key = (group.id, username);
            match row {
                Some(membership) => {
                    guard.memberships.insert(key, membership);
                }
                None => {
                    guard.memberships.remove(&key);
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl BaseNotificationStore for InMemoryStore {
    async fn create(&self, notification: NewNotification) -> Result<Notification> {
        let notification = notification.into_notification(Utc::now());
        self.state
            .lock()
            .await
            .notifications
            .push(notification.clone());
        Ok(notification)
    }

    async fn create_unread_messages_if_absent(
        &self,
        recipient: &str,
        group_id: GroupId,
        message: &str,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;
        let open = state.notifications.iter().any(|n| {
            n.recipient_username == recipient
                && n.group_id == Some(group_id)
                && n.notification_type == NotificationType::UnreadMessages
                && !n.read
        });
        if open {
            return Ok(false);
        }

        state.notifications.push(
            NewNotification::new(recipient, NotificationType::UnreadMessages, message, group_id)
                .into_notification(Utc::now()),
        );
        Ok(true)
    }

    async fn list_for_recipient(
        &self,
        recipient: &str,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .rev()
            .filter(|n| n.recipient_username == recipient && (!unread_only || !n.read))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn unread_count(&self, recipient: &str) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.recipient_username == recipient && !n.read)
            .count() as i64)
    }

    async fn mark_read(&self, id: NotificationId, recipient: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_username == recipient)
        {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl BaseMessageStore for InMemoryStore {
    async fn insert(&self, message: &Message) -> Result<()> {
        self.state.lock().await.messages.push(message.clone());
        Ok(())
    }

    async fn list(
        &self,
        group_id: GroupId,
        limit: i64,
        before: Option<MessageId>,
    ) -> Result<Vec<Message>> {
        let state = self.state.lock().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.group_id == group_id && before.map_or(true, |b| m.id < b))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        messages.truncate(limit.max(0) as usize);
        Ok(messages)
    }

    async fn mark_read(&self, ids: &[MessageId], username: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        for message in state.messages.iter_mut().filter(|m| ids.contains(&m.id)) {
            if !message.is_read_by(username) {
                message.read_by.push(username.to_string());
            }
        }
        Ok(())
    }

    async fn unread_count(&self, group_id: GroupId, username: &str) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.group_id == group_id && !m.is_read_by(username))
            .count() as i64)
    }
}

#[async_trait]
impl BaseActivityLogger for InMemoryStore {
    async fn log(
        &self,
        username: &str,
        event: ActivityEvent,
        group_id: Option<GroupId>,
    ) -> Result<()> {
        self.state
            .lock()
            .await
            .activity
            .push(ActivityEntry::new(username, event, group_id));
        Ok(())
    }

    async fn history(&self, username: &str, limit: i64) -> Result<Vec<ActivityEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .activity
            .iter()
            .rev()
            .filter(|e| e.username == username)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BaseReminderLog for InMemoryStore {
    async fn claim(&self, group_id: GroupId, username: &str, kind: ReminderKind) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .await
            .reminders
            .insert((group_id, username.to_string(), kind)))
    }

    async fn release(&self, group_id: GroupId, username: &str, kind: ReminderKind) -> Result<()> {
        self.state
            .lock()
            .await
            .reminders
            .remove(&(group_id, username.to_string(), kind));
        Ok(())
    }
}

#[async_trait]
impl BaseAccountDirectory for InMemoryStore {
    async fn email_for(&self, username: &str) -> Result<Option<String>> {
        Ok(self.state.lock().await.accounts.get(username).cloned())
    }
}

// =============================================================================
// Mock Email Service
// =============================================================================

/// Records every email instead of delivering it
#[derive(Clone, Default)]
pub struct MockEmailService {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    fail: bool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send records the message, then returns an error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, email: &str) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.to_email == email)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BaseEmailService for MockEmailService {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.lock().await.push(message.clone());
        if self.fail {
            anyhow::bail!("mock email delivery failure");
        }
        Ok(())
    }
}

// =============================================================================
// Failing Activity Logger
// =============================================================================

/// Fails the first `failures` writes, then delegates to `inner`
pub struct FailingActivityLogger<L> {
    inner: L,
    failures: u32,
    attempts: AtomicU32,
}

impl<L> FailingActivityLogger<L> {
    pub fn new(inner: L, failures: u32) -> Self {
        Self {
            inner,
            failures,
            attempts: AtomicU32::new(0),
        }
    }

    /// Never succeeds
    pub fn always(inner: L) -> Self {
        Self::new(inner, u32::MAX)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<L: BaseActivityLogger> BaseActivityLogger for FailingActivityLogger<L> {
    async fn log(
        &self,
        username: &str,
        event: ActivityEvent,
        group_id: Option<GroupId>,
    ) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            anyhow::bail!("activity log unavailable (attempt {})", attempt + 1);
        }
        self.inner.log(username, event, group_id).await
    }

    async fn history(&self, username: &str, limit: i64) -> Result<Vec<ActivityEntry>> {
        self.inner.history(username, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn group() -> Group {
        Group::builder()
            .name("Board games")
            .date_time(Utc::now() + Duration::days(1))
            .max_members(4)
            .organiser_username("olivia")
            .build()
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = InMemoryStore::new();
        let group = store.create_group(&group()).await.unwrap();

        {
            let mut tx = store.begin(group.id).await.unwrap().unwrap();
            tx.upsert(&Membership::new(group.id, "ann", MembershipStatus::Pending, Utc::now()))
                .await
                .unwrap();
            assert_eq!(tx.count_by_status(MembershipStatus::Pending).await.unwrap(), 1);
        }

        assert!(store.membership(group.id, "ann").await.is_none());
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible() {
        let store = InMemoryStore::new();
        let group = store.create_group(&group()).await.unwrap();

        let mut tx = store.begin(group.id).await.unwrap().unwrap();
        tx.upsert(&Membership::new(group.id, "ann", MembershipStatus::Approved, Utc::now()))
            .await
            .unwrap();
        assert_eq!(tx.count_by_status(MembershipStatus::Approved).await.unwrap(), 2);
        assert!(tx.delete("ann").await.unwrap());
        assert_eq!(tx.count_by_status(MembershipStatus::Approved).await.unwrap(), 1);
        tx.upsert(&Membership::new(group.id, "bob", MembershipStatus::Pending, Utc::now()))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(store.membership(group.id, "ann").await.is_none());
        assert_eq!(
            store.membership(group.id, "bob").await.map(|m| m.status),
            Some(MembershipStatus::Pending)
        );
    }

    #[tokio::test]
    async fn test_begin_on_missing_group() {
        let store = InMemoryStore::new();
        assert!(store.begin(GroupId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_group_cascades() {
        let store = InMemoryStore::new();
        let group = store.create_group(&group()).await.unwrap();
        store
            .create(NewNotification::new(
                "olivia",
                NotificationType::JoinRequest,
                "ann requested to join",
                group.id,
            ))
            .await
            .unwrap();

        assert!(store.delete_group(group.id).await.unwrap());
        assert!(store.memberships(group.id).await.is_empty());
        assert!(store.notifications_for("olivia").await.is_empty());
        assert!(!store.delete_group(group.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_unread_messages_notification_is_idempotent() {
        let store = InMemoryStore::new();
        let group_id = GroupId::new();

        assert!(store
            .create_unread_messages_if_absent("ann", group_id, "unread")
            .await
            .unwrap());
        assert!(!store
            .create_unread_messages_if_absent("ann", group_id, "unread")
            .await
            .unwrap());

        let open = store.notifications_for("ann").await;
        assert_eq!(open.len(), 1);
        BaseNotificationStore::mark_read(&store, open[0].id, "ann").await.unwrap();

        assert!(store
            .create_unread_messages_if_absent("ann", group_id, "unread")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_failing_logger_recovers() {
        let store = InMemoryStore::new();
        let logger = FailingActivityLogger::new(store.clone(), 2);

        assert!(logger.log("ann", ActivityEvent::SendMessage, None).await.is_err());
        assert!(logger.log("ann", ActivityEvent::SendMessage, None).await.is_err());
        assert!(logger.log("ann", ActivityEvent::SendMessage, None).await.is_ok());
        assert_eq!(logger.attempts(), 3);
        assert_eq!(store.activity_for("ann").await, vec![ActivityEvent::SendMessage]);
    }
}
