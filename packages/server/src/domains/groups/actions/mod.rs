//! Group lifecycle actions

use chrono::Utc;
use tracing::info;

use crate::common::GroupId;
use crate::domains::activity::{record_activity, ActivityEvent};
use crate::domains::groups::data::{CreateGroupRequest, GroupDetail};
use crate::domains::groups::models::{Group, GroupFilter};
use crate::domains::memberships::MembershipError;
use crate::kernel::ServerDeps;

/// Smallest group worth organising: the organiser plus one
pub const MIN_MAX_MEMBERS: i32 = 2;

fn validate(request: &CreateGroupRequest) -> Result<(), MembershipError> {
    let bad = |msg: &str| Err(MembershipError::BadRequest(msg.to_string()));

    if request.name.trim().is_empty() {
        return bad("name is required");
    }
    if request.max_members < MIN_MAX_MEMBERS {
        return bad("max_members must be at least 2");
    }
    if !request.cost.is_finite() || request.cost < 0.0 {
        return bad("cost cannot be negative");
    }
    if request.date_time <= Utc::now() {
        return bad("date_time must be in the future");
    }
    Ok(())
}

/// Create a group owned by `organiser`, who becomes its first approved member
pub async fn create_group(
    request: CreateGroupRequest,
    organiser: &str,
    deps: &ServerDeps,
) -> Result<Group, MembershipError> {
    validate(&request)?;

    let group = Group::builder()
        .name(request.name.trim())
        .description(request.description)
        .activity_type(request.activity_type)
        .skill_level(request.skill_level)
        .cost(request.cost)
        .date_time(request.date_time)
        .max_members(request.max_members)
        .organiser_username(organiser)
        .build();

    let group = deps.groups.create_group(&group).await?;
    info!(group_id = %group.id, organiser, "Group created");

    record_activity(deps, organiser, ActivityEvent::CreateGroup, Some(group.id)).await;

    Ok(group)
}

pub async fn list_groups(
    filter: &GroupFilter,
    deps: &ServerDeps,
) -> Result<Vec<Group>, MembershipError> {
    Ok(deps.groups.list_groups(filter).await?)
}

pub async fn get_group(id: GroupId, deps: &ServerDeps) -> Result<GroupDetail, MembershipError> {
    let group = deps
        .groups
        .find_group(id)
        .await?
        .ok_or_else(MembershipError::group_not_found)?;
    let memberships = deps.groups.list_memberships(id, None).await?;

    Ok(GroupDetail::new(group, memberships))
}

/// Delete a group. Organiser only; memberships, notifications and messages go with it.
pub async fn delete_group(
    id: GroupId,
    actor: &str,
    deps: &ServerDeps,
) -> Result<(), MembershipError> {
    let group = deps
        .groups
        .find_group(id)
        .await?
        .ok_or_else(MembershipError::group_not_found)?;

    if !group.is_organiser(actor) {
        return Err(MembershipError::Forbidden(
            "only the organiser can delete this group",
        ));
    }

    if !deps.groups.delete_group(id).await? {
        return Err(MembershipError::group_not_found());
    }
    info!(group_id = %id, actor, "Group deleted");

    record_activity(deps, actor, ActivityEvent::DeleteGroup, Some(id)).await;

    Ok(())
}
