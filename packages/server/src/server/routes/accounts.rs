use axum::{
    extract::{Extension, Path},
    Json,
};

use crate::domains::activity::{activity_history, ActivityEntry};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::middleware::AuthUser;

/// Activity history of any account; callers must be signed in
pub async fn history_handler(
    Extension(state): Extension<AppState>,
    _user: AuthUser,
    Path(username): Path<String>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError> {
    Ok(Json(activity_history(&username, &state.deps).await?))
}
