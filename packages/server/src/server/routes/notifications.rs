use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::NotificationId;
use crate::domains::notifications::actions::{
    list_notifications, mark_notification_read, unread_notification_count,
};
use crate::domains::notifications::Notification;
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<i64>,
}

pub async fn list_notifications_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(
        list_notifications(&user.username, query.unread, query.limit, &state.deps).await?,
    ))
}

pub async fn unread_count_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let count = unread_notification_count(&user.username, &state.deps).await?;
    Ok(Json(json!({ "unread_count": count })))
}

pub async fn mark_read_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<Value>, ApiError> {
    mark_notification_read(id, &user.username, &state.deps).await?;
    Ok(Json(json!({ "message": "Notification marked as read" })))
}
