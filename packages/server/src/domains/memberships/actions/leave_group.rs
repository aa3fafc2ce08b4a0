use crate::common::GroupId;
use crate::domains::activity::{record_activity, ActivityEvent};
use crate::domains::memberships::machines::MembershipAction;
use crate::domains::memberships::MembershipError;
use crate::domains::notifications::{notify, NewNotification, NotificationType};
use crate::kernel::ServerDeps;

use super::transition::apply_transition;

/// Withdraw a pending request or leave as an approved member.
///
/// Only the organiser is told; nobody receives `member_joined` here.
pub async fn leave_group(
    group_id: GroupId,
    username: &str,
    deps: &ServerDeps,
) -> Result<(), MembershipError> {
    let applied =
        apply_transition(deps, MembershipAction::Leave, group_id, username, username).await?;
    let group = &applied.group;

    record_activity(deps, username, ActivityEvent::LeaveGroup, Some(group_id)).await;

    notify(
        deps,
        NewNotification::new(
            &group.organiser_username,
            NotificationType::LeaveGroup,
            format!("{} has left your group '{}'", username, group.name),
            group_id,
        ),
    )
    .await;

    Ok(())
}
