//! Postgres-backed harness for exercising the SQL paths.
//!
//! One container and one migration run are shared by every test in the
//! binary. Tests share the database, so each one works on its own groups and
//! filters its assertions by group id.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use groops_core::common::{GroupId, JwtService};
use groops_core::domains::groups::models::{ActivityType, Group, SkillLevel};
use groops_core::domains::memberships::{Membership, MembershipPolicy, MembershipStatus};
use groops_core::kernel::{
    BaseGroupStore, MembershipTransaction, MockEmailService, PgStore, ServerDeps,
    UnreadCheckSettings,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use super::{email_of, ORGANISER, USERS};

/// Container and migrated schema shared across the test binary
struct SharedPostgres {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_POSTGRES: OnceCell<SharedPostgres> = OnceCell::const_new();

impl SharedPostgres {
    async fn init() -> Result<Self> {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host = postgres.get_host().await?;
        let port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        for user in USERS {
            sqlx::query(
                "INSERT INTO accounts (username, email) VALUES ($1, $2)
                 ON CONFLICT (username) DO NOTHING",
            )
            .bind(user)
            .bind(email_of(user))
            .execute(&pool)
            .await
            .context("Failed to seed accounts")?;
        }

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_POSTGRES
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared Postgres")
            })
            .await
    }
}

/// Real `PgStore` behind the same actions the router uses
pub struct PgHarness {
    pub store: PgStore,
    pub email: MockEmailService,
    pub deps: ServerDeps,
}

impl AsyncTestContext for PgHarness {
    async fn setup() -> Self {
        Self::new()
            .await
            .expect("Failed to create Postgres harness")
    }

    async fn teardown(self) {
        self.deps.tasks.shutdown().await;
    }
}

impl PgHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedPostgres::get().await;

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;

        let store = PgStore::new(pool);
        let email = MockEmailService::new();
        let shared = Arc::new(store.clone());

        let deps = ServerDeps::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared,
            Arc::new(email.clone()),
            Arc::new(JwtService::new("test_secret_key", "groops-test".to_string())),
            MembershipPolicy {
                activity_log_backoff: std::time::Duration::ZERO,
                ..MembershipPolicy::default()
            },
            UnreadCheckSettings::default(),
        );

        Ok(Self { store, email, deps })
    }

    /// Insert a group organised by `olivia` starting `starts_in` from now
    pub async fn create_group(&self, name: &str, max_members: i32, starts_in: Duration) -> Group {
        let group = Group::builder()
            .name(name)
            .activity_type(ActivityType::Sport)
            .skill_level(SkillLevel::Beginner)
            .date_time(Utc::now() + starts_in)
            .max_members(max_members)
            .organiser_username(ORGANISER)
            .build();

        self.store
            .create_group(&group)
            .await
            .expect("Failed to create test group")
    }

    /// Write a membership row through a locked transaction
    pub async fn seed_membership(&self, group_id: GroupId, username: &str, status: MembershipStatus) {
        let mut tx = self
            .store
            .begin(group_id)
            .await
            .expect("Failed to begin transaction")
            .expect("Group not found");
        tx.upsert(&Membership::new(group_id, username, status, Utc::now()))
            .await
            .expect("Failed to upsert membership");
        tx.commit().await.expect("Failed to commit membership");
    }

    /// Notifications of one type for a member in one group
    pub async fn notification_count(&self, username: &str, group_id: GroupId, kind: &str) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications
             WHERE recipient_username = $1 AND group_id = $2 AND type::text = $3",
        )
        .bind(username)
        .bind(group_id)
        .bind(kind)
        .fetch_one(self.store.pool())
        .await
        .expect("Failed to count notifications")
    }
}
