//! Pre-event reminder emails
//!
//! Each pass looks at groups starting within the next day and emails every
//! approved member whose reminder window is open. The reminder log is claimed
//! before sending, so overlapping passes never double-send; a failed send
//! releases its claim and is retried on the next pass while the window lasts.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::domains::groups::models::Group;
use crate::domains::memberships::models::MembershipStatus;
use crate::domains::notifications::emails::event_reminder;
use crate::domains::reminders::models::ReminderKind;
use crate::kernel::ServerDeps;

/// Send every reminder due at `now`; returns how many emails went out
pub async fn send_due_reminders(
    now: DateTime<Utc>,
    slack: Duration,
    deps: &ServerDeps,
) -> anyhow::Result<usize> {
    let horizon = ReminderKind::ALL
        .iter()
        .map(ReminderKind::lead)
        .max()
        .unwrap_or_else(Duration::zero);

    let groups = deps.groups.groups_starting_between(now, now + horizon).await?;
    let mut sent = 0;

    for group in &groups {
        for kind in ReminderKind::ALL {
            if kind.is_due(group.date_time, now, slack) {
                sent += remind_members(group, kind, deps).await?;
            }
        }
    }

    if sent > 0 {
        info!(sent, groups = groups.len(), "Event reminders sent");
    }
    Ok(sent)
}

async fn remind_members(group: &Group, kind: ReminderKind, deps: &ServerDeps) -> anyhow::Result<usize> {
    let members = deps
        .groups
        .list_memberships(group.id, Some(MembershipStatus::Approved))
        .await?;
    let mut sent = 0;

    for member in members {
        let username = member.username.as_str();
        let Some(address) = deps.accounts.email_for(username).await? else {
            warn!(group_id = %group.id, username, ?kind, "No account email on file, skipping reminder");
            continue;
        };

        if !deps.reminders.claim(group.id, username, kind).await? {
            debug!(group_id = %group.id, username, ?kind, "Reminder already sent");
            continue;
        }

        let message = event_reminder(kind, &address, username, &group.name, group.date_time);
        match deps.email.send(&message).await {
            Ok(()) => sent += 1,
            Err(e) => {
                warn!(group_id = %group.id, username, ?kind, error = %e, "Failed to send reminder");
                if let Err(e) = deps.reminders.release(group.id, username, kind).await {
                    warn!(group_id = %group.id, username, ?kind, error = %e, "Failed to release reminder claim");
                }
            }
        }
    }

    Ok(sent)
}
