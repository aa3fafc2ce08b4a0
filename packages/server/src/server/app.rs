//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    approve_member_handler, create_group_handler, delete_group_handler, get_group_handler,
    health_handler, history_handler, join_group_handler, leave_group_handler,
    list_groups_handler, list_messages_handler, list_notifications_handler, mark_read_handler,
    pending_members_handler, reject_member_handler, remove_member_handler, send_message_handler,
    unread_count_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        // Development: allow any origin
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins).allow_credentials(true)
    }
}

/// Build the Axum application router
///
/// All REST endpoints live under `/api`; `/health` stays at the root.
pub fn build_app(deps: ServerDeps, allowed_origins: &[String]) -> Router {
    let jwt_service = deps.jwt_service.clone();
    let app_state = AppState {
        deps: Arc::new(deps),
    };

    let api = Router::new()
        // Groups
        .route("/groups", get(list_groups_handler).post(create_group_handler))
        .route(
            "/groups/:id",
            get(get_group_handler).delete(delete_group_handler),
        )
        // Membership workflow
        .route("/groups/:id/join", post(join_group_handler))
        .route("/groups/:id/leave", post(leave_group_handler))
        .route("/groups/:id/pending-members", get(pending_members_handler))
        .route(
            "/groups/:id/members/:username/approve",
            post(approve_member_handler),
        )
        .route(
            "/groups/:id/members/:username/reject",
            post(reject_member_handler),
        )
        .route(
            "/groups/:id/members/:username/remove",
            post(remove_member_handler),
        )
        // Messages
        .route(
            "/groups/:id/messages",
            get(list_messages_handler).post(send_message_handler),
        )
        // Notifications
        .route("/notifications", get(list_notifications_handler))
        .route("/notifications/unread-count", get(unread_count_handler))
        .route("/notifications/:id/read", post(mark_read_handler))
        // Accounts
        .route("/accounts/:username/history", get(history_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
