//! Notification actions
//!
//! `notify` and `send_membership_email` are the side-effect half of the
//! membership workflow: both swallow failures after logging them.

use tracing::{debug, warn};

use crate::common::NotificationId;
use crate::domains::memberships::MembershipError;
use crate::domains::notifications::emails::MembershipEmail;
use crate::domains::notifications::models::{NewNotification, Notification};
use crate::kernel::ServerDeps;

pub const DEFAULT_LIST_LIMIT: i64 = 10;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Create an in-app notification, logging instead of failing
pub async fn notify(deps: &ServerDeps, notification: NewNotification) {
    let recipient = notification.recipient_username.clone();
    let kind = notification.notification_type;

    match deps.notifications.create(notification).await {
        Ok(created) => debug!(recipient = %recipient, ?kind, id = %created.id, "Notification created"),
        Err(e) => warn!(recipient = %recipient, ?kind, error = %e, "Failed to create notification"),
    }
}

/// Send a membership email in the background.
///
/// The recipient's address comes from the account directory; unknown
/// accounts and delivery failures are logged and dropped.
pub fn send_membership_email(
    deps: &ServerDeps,
    recipient: &str,
    group_name: &str,
    email: MembershipEmail,
) {
    let accounts = deps.accounts.clone();
    let sender = deps.email.clone();
    let recipient = recipient.to_string();
    let group_name = group_name.to_string();

    deps.tasks.spawn(async move {
        let address = match accounts.email_for(&recipient).await {
            Ok(Some(address)) => address,
            Ok(None) => {
                warn!(recipient = %recipient, "No account email on file, skipping email");
                return;
            }
            Err(e) => {
                warn!(recipient = %recipient, error = %e, "Account lookup failed, skipping email");
                return;
            }
        };

        let message = email.render(&address, &recipient, &group_name);
        if let Err(e) = sender.send(&message).await {
            warn!(recipient = %recipient, subject = %message.subject, error = %e, "Failed to send email");
        }
    });
}

/// Resolve a `limit` query value: out-of-range values fall back to the default
pub fn list_limit(requested: Option<i64>) -> i64 {
    match requested {
        Some(limit) if (1..=MAX_LIST_LIMIT).contains(&limit) => limit,
        _ => DEFAULT_LIST_LIMIT,
    }
}

pub async fn list_notifications(
    username: &str,
    unread_only: bool,
    limit: Option<i64>,
    deps: &ServerDeps,
) -> Result<Vec<Notification>, MembershipError> {
    Ok(deps
        .notifications
        .list_for_recipient(username, unread_only, list_limit(limit))
        .await?)
}

pub async fn unread_notification_count(
    username: &str,
    deps: &ServerDeps,
) -> Result<i64, MembershipError> {
    Ok(deps.notifications.unread_count(username).await?)
}

/// Mark one of the caller's notifications read
pub async fn mark_notification_read(
    id: NotificationId,
    username: &str,
    deps: &ServerDeps,
) -> Result<(), MembershipError> {
    if deps.notifications.mark_read(id, username).await? {
        Ok(())
    } else {
        Err(MembershipError::NotFound("notification not found"))
    }
}
