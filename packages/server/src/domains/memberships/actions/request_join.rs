//! Request to join a group

use crate::common::GroupId;
use crate::domains::activity::{record_activity, ActivityEvent};
use crate::domains::memberships::machines::MembershipAction;
use crate::domains::memberships::models::Membership;
use crate::domains::memberships::MembershipError;
use crate::domains::notifications::{
    notify, send_membership_email, MembershipEmail, NewNotification, NotificationType,
};
use crate::kernel::ServerDeps;

use super::transition::apply_transition;

/// Create or re-submit `username`'s join request.
///
/// On success the organiser gets a `join_request` notification and email.
pub async fn request_join(
    group_id: GroupId,
    username: &str,
    deps: &ServerDeps,
) -> Result<Membership, MembershipError> {
    let applied =
        apply_transition(deps, MembershipAction::RequestJoin, group_id, username, username).await?;
    let group = &applied.group;

    record_activity(deps, username, ActivityEvent::JoinGroupRequest, Some(group_id)).await;

    notify(
        deps,
        NewNotification::new(
            &group.organiser_username,
            NotificationType::JoinRequest,
            format!("{} requested to join your group '{}'", username, group.name),
            group_id,
        ),
    )
    .await;

    send_membership_email(
        deps,
        &group.organiser_username,
        &group.name,
        MembershipEmail::JoinRequest {
            requester: username.to_string(),
        },
    );

    Ok(applied.membership)
}
