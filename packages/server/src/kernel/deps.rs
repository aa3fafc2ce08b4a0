//! Server dependencies for actions (using traits for testability)
//!
//! This module provides the central dependency container used by all domain actions.
//! Storage and delivery go through trait objects so tests can swap in the
//! in-memory doubles from `test_dependencies`.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::common::{GroupId, JwtService};
use crate::config::Config;
use crate::domains::memberships::MembershipPolicy;
use crate::kernel::{
    BaseAccountDirectory, BaseActivityLogger, BaseEmailService, BaseGroupStore, BaseMessageStore,
    BaseNotificationStore, BaseReminderLog, DeferredTaskQueue, NoopEmailService, PgStore,
    SendGridClient,
};

/// Timing of the deferred unread-messages check
#[derive(Debug, Clone, Copy)]
pub struct UnreadCheckSettings {
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for UnreadCheckSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(crate::config::MIN_UNREAD_CHECK_DELAY_SECS),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Server dependencies accessible to actions
#[derive(Clone)]
pub struct ServerDeps {
    pub groups: Arc<dyn BaseGroupStore>,
    pub notifications: Arc<dyn BaseNotificationStore>,
    pub messages: Arc<dyn BaseMessageStore>,
    pub activity: Arc<dyn BaseActivityLogger>,
    pub reminders: Arc<dyn BaseReminderLog>,
    pub accounts: Arc<dyn BaseAccountDirectory>,
    pub email: Arc<dyn BaseEmailService>,
    /// JWT service for token verification
    pub jwt_service: Arc<JwtService>,
    /// Deferred unread checks (batched by group, one sender per post) and
    /// fire-and-forget sends
    pub tasks: DeferredTaskQueue<GroupId, String>,
    pub policy: MembershipPolicy,
    pub unread_check: UnreadCheckSettings,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        groups: Arc<dyn BaseGroupStore>,
        notifications: Arc<dyn BaseNotificationStore>,
        messages: Arc<dyn BaseMessageStore>,
        activity: Arc<dyn BaseActivityLogger>,
        reminders: Arc<dyn BaseReminderLog>,
        accounts: Arc<dyn BaseAccountDirectory>,
        email: Arc<dyn BaseEmailService>,
        jwt_service: Arc<JwtService>,
        policy: MembershipPolicy,
        unread_check: UnreadCheckSettings,
    ) -> Self {
        Self {
            groups,
            notifications,
            messages,
            activity,
            reminders,
            accounts,
            email,
            jwt_service,
            tasks: DeferredTaskQueue::new(unread_check.timeout),
            policy,
            unread_check,
        }
    }

    /// Production wiring: Postgres for every store, SendGrid when a key is configured
    pub fn from_config(pool: PgPool, config: &Config) -> Self {
        let store = Arc::new(PgStore::new(pool));

        let email: Arc<dyn BaseEmailService> = match &config.sendgrid_api_key {
            Some(key) => Arc::new(SendGridClient::new(
                key.clone(),
                config.sendgrid_from_email.clone(),
                config.sendgrid_from_name.clone(),
            )),
            None => {
                tracing::warn!("SENDGRID_API_KEY not set, outgoing email is disabled");
                Arc::new(NoopEmailService)
            }
        };

        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            email,
            Arc::new(JwtService::new(
                &config.jwt_secret,
                config.jwt_issuer.clone(),
            )),
            config.membership_policy(),
            UnreadCheckSettings {
                delay: config.unread_check_delay(),
                timeout: config.unread_check_timeout(),
            },
        )
    }
}
