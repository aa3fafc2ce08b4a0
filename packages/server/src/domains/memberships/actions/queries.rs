use crate::common::GroupId;
use crate::domains::memberships::models::{Membership, MembershipStatus};
use crate::domains::memberships::MembershipError;
use crate::kernel::ServerDeps;

/// Pending join requests of a group, oldest first. Organiser only.
///
/// Read-only, so the lockout window does not apply.
pub async fn list_pending_members(
    group_id: GroupId,
    actor: &str,
    deps: &ServerDeps,
) -> Result<Vec<Membership>, MembershipError> {
    let group = deps
        .groups
        .find_group(group_id)
        .await?
        .ok_or_else(MembershipError::group_not_found)?;

    if !group.is_organiser(actor) {
        return Err(MembershipError::Forbidden(
            "only the organiser can view pending requests",
        ));
    }

    Ok(deps
        .groups
        .list_memberships(group_id, Some(MembershipStatus::Pending))
        .await?)
}

/// Whether `username` is an approved member of the group (organiser included)
pub async fn is_approved_member(
    group_id: GroupId,
    username: &str,
    deps: &ServerDeps,
) -> Result<bool, MembershipError> {
    Ok(deps
        .groups
        .list_memberships(group_id, Some(MembershipStatus::Approved))
        .await?
        .iter()
        .any(|m| m.username == username))
}
