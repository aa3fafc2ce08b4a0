use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::common::{GroupId, MessageId};
use crate::domains::messages::{list_messages, send_message, Message};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagePage {
    pub limit: Option<i64>,
    pub before: Option<MessageId>,
}

pub async fn send_message_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(group_id): Path<GroupId>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let Json(request) = payload?;
    let message = send_message(group_id, &user.username, &request.content, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list_messages_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(group_id): Path<GroupId>,
    Query(page): Query<MessagePage>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(
        list_messages(group_id, &user.username, page.limit, page.before, &state.deps).await?,
    ))
}
