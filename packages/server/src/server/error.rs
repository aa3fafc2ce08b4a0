use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::common::AuthError;
use crate::domains::memberships::MembershipError;

/// Error returned by REST handlers, rendered as `{"error": "<message>"}`
#[derive(Debug)]
pub struct ApiError(pub MembershipError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MembershipError::NotFound(_) => StatusCode::NOT_FOUND,
            MembershipError::Forbidden(_) => StatusCode::FORBIDDEN,
            MembershipError::Conflict(_) => StatusCode::CONFLICT,
            // Full groups and closed windows are refusals, not conflicts
            MembershipError::CapacityExceeded | MembershipError::WindowClosed => {
                StatusCode::FORBIDDEN
            }
            MembershipError::BadRequest(_) => StatusCode::BAD_REQUEST,
            MembershipError::Unauthenticated => StatusCode::UNAUTHORIZED,
            MembershipError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        Self(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationRequired | AuthError::InvalidToken => {
                Self(MembershipError::Unauthenticated)
            }
            AuthError::InternalError(e) => Self(MembershipError::Internal(e)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(MembershipError::BadRequest(format!(
            "Invalid input: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self.0 {
            MembershipError::Internal(e) => {
                error!(error = %e, "Request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
