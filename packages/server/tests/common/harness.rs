//! Test harness for integration testing.
//!
//! Wires the real router and actions over the in-memory store, a recording
//! email service and a real JWT service. Nothing external is started, so each
//! test gets a fresh, isolated world.

use anyhow::Result;
use axum::Router;
use groops_core::common::JwtService;
use groops_core::domains::memberships::MembershipPolicy;
use groops_core::kernel::{
    BaseActivityLogger, InMemoryStore, MockEmailService, ServerDeps, UnreadCheckSettings,
};
use groops_core::server::build_app;
use std::sync::Arc;
use std::time::Duration;
use test_context::AsyncTestContext;

use super::ApiClient;

/// Accounts every harness knows; email is `<username>@example.com`.
pub const USERS: [&str; 6] = ["olivia", "alice", "bob", "carol", "dave", "erin"];

/// Test harness that manages test infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let response = ctx.client("alice").get("/api/groups").await;
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    /// Backing store - use this for fixtures and assertions.
    pub store: InMemoryStore,
    /// Every email the app tried to send.
    pub email: MockEmailService,
    /// Same dependencies the router uses, for calling actions directly.
    pub deps: ServerDeps,
    jwt_service: Arc<JwtService>,
    app: Router,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
            .await
            .expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.deps.tasks.shutdown().await;
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        Self::with_services(None, MockEmailService::new()).await
    }

    /// Harness whose activity log goes through `activity` instead of the store.
    pub async fn with_activity_logger(activity: Arc<dyn BaseActivityLogger>) -> Result<Self> {
        Self::with_services(Some(activity), MockEmailService::new()).await
    }

    pub async fn with_email(email: MockEmailService) -> Result<Self> {
        Self::with_services(None, email).await
    }

    async fn with_services(
        activity: Option<Arc<dyn BaseActivityLogger>>,
        email: MockEmailService,
    ) -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = InMemoryStore::new();
        for user in USERS {
            store.add_account(user, &email_of(user)).await;
        }

        let jwt_service = Arc::new(JwtService::new(
            "test_secret_key",
            "groops-test".to_string(),
        ));

        let deps = ServerDeps::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            activity.unwrap_or_else(|| Arc::new(store.clone())),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(email.clone()),
            jwt_service.clone(),
            MembershipPolicy {
                activity_log_backoff: Duration::ZERO,
                ..MembershipPolicy::default()
            },
            UnreadCheckSettings::default(),
        );

        let app = build_app(deps.clone(), &[]);

        Ok(Self {
            store,
            email,
            deps,
            jwt_service,
            app,
        })
    }

    /// Session token for `username`.
    pub fn token(&self, username: &str) -> String {
        self.jwt_service
            .create_token(username)
            .expect("Failed to create token")
    }

    /// Client that authenticates as `username`.
    pub fn client(&self, username: &str) -> ApiClient {
        ApiClient::new(self.app.clone(), Some(self.token(username)))
    }

    /// Client that sends no Authorization header.
    pub fn anonymous(&self) -> ApiClient {
        ApiClient::new(self.app.clone(), None)
    }

    /// Client that sends an arbitrary Authorization token.
    pub fn with_token(&self, token: &str) -> ApiClient {
        ApiClient::new(self.app.clone(), Some(token.to_string()))
    }

    /// Wait for background sends to run.
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

pub fn email_of(username: &str) -> String {
    format!("{}@example.com", username)
}
