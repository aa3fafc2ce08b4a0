//! Group chat actions
//!
//! Posting a message schedules a deferred unread check for the group. Checks
//! for one group coalesce, and the notification insert is idempotent, so a
//! burst of messages yields at most one open `unread_messages` notification
//! per member. A coalesced check remembers who posted, and a member is only
//! notified when someone else contributed to the burst.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::common::{GroupId, MessageId};
use crate::domains::activity::{record_activity, ActivityEvent};
use crate::domains::memberships::actions::is_approved_member;
use crate::domains::memberships::{MembershipError, MembershipStatus};
use crate::domains::messages::models::{Message, MAX_MESSAGE_CHARS};
use crate::kernel::ServerDeps;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

async fn require_approved_member(
    group_id: GroupId,
    username: &str,
    deps: &ServerDeps,
) -> Result<(), MembershipError> {
    if deps.groups.find_group(group_id).await?.is_none() {
        return Err(MembershipError::group_not_found());
    }
    if !is_approved_member(group_id, username, deps).await? {
        return Err(MembershipError::Forbidden(
            "only approved members can access group messages",
        ));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<&str, MembershipError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(MembershipError::BadRequest(
            "message content cannot be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(MembershipError::BadRequest(format!(
            "message content cannot exceed {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(content)
}

/// Post a message to a group the sender is an approved member of
pub async fn send_message(
    group_id: GroupId,
    username: &str,
    content: &str,
    deps: &ServerDeps,
) -> Result<Message, MembershipError> {
    let content = validate_content(content)?;
    require_approved_member(group_id, username, deps).await?;

    let message = Message::new(group_id, username, content);
    deps.messages.insert(&message).await?;
    info!(group_id = %group_id, username, message_id = %message.id, "Message posted");

    record_activity(deps, username, ActivityEvent::SendMessage, Some(group_id)).await;

    schedule_unread_check(group_id, username, deps).await;

    Ok(message)
}

/// Queue the deferred unread check for `group_id` on behalf of `sender`
pub async fn schedule_unread_check(group_id: GroupId, sender: &str, deps: &ServerDeps) {
    let task_deps = deps.clone();
    let scheduled = deps
        .tasks
        .schedule(
            group_id,
            sender.to_string(),
            deps.unread_check.delay,
            move |senders| async move {
                notify_unread_members(group_id, &senders, &task_deps).await
            },
        )
        .await;

    if !scheduled {
        debug!(group_id = %group_id, sender, "Unread check already pending");
    }
}

/// Give approved members with unread messages an `unread_messages`
/// notification, unless they already have an open one for this group.
///
/// `senders` are the authors of the posts that triggered this check. A member
/// who is the only one among them is skipped.
pub async fn notify_unread_members(
    group_id: GroupId,
    senders: &[String],
    deps: &ServerDeps,
) -> anyhow::Result<()> {
    let senders: HashSet<&str> = senders.iter().map(String::as_str).collect();
    if senders.is_empty() {
        return Ok(());
    }

    let Some(group) = deps.groups.find_group(group_id).await? else {
        debug!(group_id = %group_id, "Group gone before unread check ran");
        return Ok(());
    };

    let members = deps
        .groups
        .list_memberships(group_id, Some(MembershipStatus::Approved))
        .await?;
    let text = format!("You have unread messages in '{}'", group.name);

    for member in members {
        if senders.iter().all(|sender| *sender == member.username) {
            continue;
        }

        let unread = deps.messages.unread_count(group_id, &member.username).await?;
        if unread == 0 {
            continue;
        }

        let created = deps
            .notifications
            .create_unread_messages_if_absent(&member.username, group_id, &text)
            .await?;
        if created {
            debug!(group_id = %group_id, username = %member.username, unread, "Unread notification created");
        }
    }

    Ok(())
}

fn page_size(limit: Option<i64>) -> i64 {
    match limit {
        Some(limit) if limit > 0 => limit.min(MAX_PAGE_SIZE),
        _ => DEFAULT_PAGE_SIZE,
    }
}

/// Newest messages first; returned messages are marked read by the caller
pub async fn list_messages(
    group_id: GroupId,
    username: &str,
    limit: Option<i64>,
    before: Option<MessageId>,
    deps: &ServerDeps,
) -> Result<Vec<Message>, MembershipError> {
    require_approved_member(group_id, username, deps).await?;

    let mut messages = deps.messages.list(group_id, page_size(limit), before).await?;

    let unread: Vec<MessageId> = messages
        .iter()
        .filter(|m| !m.is_read_by(username))
        .map(|m| m.id)
        .collect();

    if !unread.is_empty() {
        deps.messages.mark_read(&unread, username).await?;
        for message in messages.iter_mut().filter(|m| unread.contains(&m.id)) {
            message.read_by.push(username.to_string());
        }
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content() {
        assert_eq!(validate_content("  hi  ").unwrap(), "hi");
        assert!(matches!(
            validate_content("   "),
            Err(MembershipError::BadRequest(_))
        ));
        assert!(validate_content(&"a".repeat(MAX_MESSAGE_CHARS)).is_ok());
        assert!(validate_content(&"a".repeat(MAX_MESSAGE_CHARS + 1)).is_err());
    }

    #[test]
    fn test_page_size() {
        assert_eq!(page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(page_size(Some(500)), MAX_PAGE_SIZE);
        assert_eq!(page_size(Some(20)), 20);
    }
}
