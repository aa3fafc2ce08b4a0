use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::common::GroupId;
use crate::domains::groups::actions::{create_group, delete_group, get_group, list_groups};
use crate::domains::groups::{CreateGroupRequest, Group, GroupDetail, GroupFilter};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

pub async fn create_group_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateGroupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let Json(request) = payload?;
    let group = create_group(request, &user.username, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn list_groups_handler(
    Extension(state): Extension<AppState>,
    Query(filter): Query<GroupFilter>,
) -> Result<Json<Vec<Group>>, ApiError> {
    Ok(Json(list_groups(&filter, &state.deps).await?))
}

pub async fn get_group_handler(
    Extension(state): Extension<AppState>,
    Path(group_id): Path<GroupId>,
) -> Result<Json<GroupDetail>, ApiError> {
    Ok(Json(get_group(group_id, &state.deps).await?))
}

pub async fn delete_group_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(group_id): Path<GroupId>,
) -> Result<Json<Value>, ApiError> {
    delete_group(group_id, &user.username, &state.deps).await?;
    Ok(Json(json!({ "message": "Group deleted" })))
}
