use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::common::GroupId;
use crate::domains::groups::MemberData;
use crate::domains::memberships::actions::{
    approve_member, leave_group, list_pending_members, reject_member, remove_member, request_join,
};
use crate::domains::memberships::Membership;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

pub async fn join_group_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(group_id): Path<GroupId>,
) -> Result<(StatusCode, Json<Membership>), ApiError> {
    let membership = request_join(group_id, &user.username, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

pub async fn leave_group_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(group_id): Path<GroupId>,
) -> Result<Json<Value>, ApiError> {
    leave_group(group_id, &user.username, &state.deps).await?;
    Ok(Json(json!({ "message": "Left group" })))
}

pub async fn pending_members_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(group_id): Path<GroupId>,
) -> Result<Json<Vec<MemberData>>, ApiError> {
    let pending = list_pending_members(group_id, &user.username, &state.deps).await?;
    Ok(Json(pending.into_iter().map(MemberData::from).collect()))
}

pub async fn approve_member_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((group_id, username)): Path<(GroupId, String)>,
) -> Result<Json<Membership>, ApiError> {
    Ok(Json(
        approve_member(group_id, &username, &user.username, &state.deps).await?,
    ))
}

pub async fn reject_member_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((group_id, username)): Path<(GroupId, String)>,
) -> Result<Json<Membership>, ApiError> {
    Ok(Json(
        reject_member(group_id, &username, &user.username, &state.deps).await?,
    ))
}

pub async fn remove_member_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path((group_id, username)): Path<(GroupId, String)>,
) -> Result<Json<Value>, ApiError> {
    remove_member(group_id, &username, &user.username, &state.deps).await?;
    Ok(Json(json!({ "message": "Member removed" })))
}
