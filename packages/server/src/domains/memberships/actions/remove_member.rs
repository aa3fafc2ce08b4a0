use crate::common::GroupId;
use crate::domains::activity::{record_activity, ActivityEvent};
use crate::domains::memberships::machines::MembershipAction;
use crate::domains::memberships::MembershipError;
use crate::domains::notifications::{
    notify, send_membership_email, MembershipEmail, NewNotification, NotificationType,
};
use crate::kernel::ServerDeps;

use super::transition::apply_transition;

/// Organiser removes an approved member
pub async fn remove_member(
    group_id: GroupId,
    target: &str,
    actor: &str,
    deps: &ServerDeps,
) -> Result<(), MembershipError> {
    let applied = apply_transition(deps, MembershipAction::Remove, group_id, actor, target).await?;
    let group = &applied.group;

    record_activity(deps, actor, ActivityEvent::RemoveMember, Some(group_id)).await;

    notify(
        deps,
        NewNotification::new(
            target,
            NotificationType::RemovedFromGroup,
            format!("You have been removed from group '{}'", group.name),
            group_id,
        ),
    )
    .await;

    send_membership_email(deps, target, &group.name, MembershipEmail::MemberRemoved);

    Ok(())
}
