//! Organiser review of pending join requests

use futures::future::join_all;

use crate::common::GroupId;
use crate::domains::activity::{record_activity, ActivityEvent};
use crate::domains::memberships::machines::MembershipAction;
use crate::domains::memberships::models::{Membership, MembershipStatus};
use crate::domains::memberships::MembershipError;
use crate::domains::notifications::{
    notify, send_membership_email, MembershipEmail, NewNotification, NotificationType,
};
use crate::kernel::ServerDeps;

use super::transition::apply_transition;

/// Approve a pending request, consuming one slot of capacity.
///
/// Notifies the new member, emails them, and tells every other approved
/// member except the organiser that someone joined.
pub async fn approve_member(
    group_id: GroupId,
    target: &str,
    actor: &str,
    deps: &ServerDeps,
) -> Result<Membership, MembershipError> {
    let applied = apply_transition(deps, MembershipAction::Approve, group_id, actor, target).await?;
    let group = &applied.group;

    record_activity(deps, target, ActivityEvent::JoinGroupApproved, Some(group_id)).await;

    notify(
        deps,
        NewNotification::new(
            target,
            NotificationType::JoinApproved,
            format!("Your request to join group '{}' was approved", group.name),
            group_id,
        ),
    )
    .await;

    send_membership_email(deps, target, &group.name, MembershipEmail::JoinApproved);

    match deps
        .groups
        .list_memberships(group_id, Some(MembershipStatus::Approved))
        .await
    {
        Ok(members) => {
            let message = format!("{} joined the group '{}'", target, group.name);
            join_all(
                members
                    .iter()
                    .filter(|m| m.username != target && !group.is_organiser(&m.username))
                    .map(|m| {
                        notify(
                            deps,
                            NewNotification::new(
                                &m.username,
                                NotificationType::MemberJoined,
                                message.clone(),
                                group_id,
                            ),
                        )
                    }),
            )
            .await;
        }
        Err(e) => {
            tracing::warn!(group_id = %group_id, error = %e, "Could not load members for member_joined notifications");
        }
    }

    Ok(applied.membership)
}

/// Reject a pending request
pub async fn reject_member(
    group_id: GroupId,
    target: &str,
    actor: &str,
    deps: &ServerDeps,
) -> Result<Membership, MembershipError> {
    let applied = apply_transition(deps, MembershipAction::Reject, group_id, actor, target).await?;

    record_activity(deps, target, ActivityEvent::JoinGroupRejected, Some(group_id)).await;

    notify(
        deps,
        NewNotification::new(
            target,
            NotificationType::JoinRejected,
            format!("Your request to join group '{}' was rejected", applied.group.name),
            group_id,
        ),
    )
    .await;

    Ok(applied.membership)
}
