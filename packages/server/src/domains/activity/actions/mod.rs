//! Activity log actions
//!
//! Writes are best-effort: a failed write is retried with linear backoff and
//! then dropped. Callers never see the error.

use tracing::{debug, warn};

use crate::common::GroupId;
use crate::domains::activity::models::{ActivityEntry, ActivityEvent};
use crate::domains::memberships::MembershipError;
use crate::kernel::ServerDeps;

/// Most entries returned by a history query
pub const HISTORY_LIMIT: i64 = 100;

/// Record an activity entry, retrying per the membership policy.
///
/// Attempt `n` that fails waits `n * backoff` before the next one. After the
/// last attempt the failure is logged and swallowed.
pub async fn record_activity(
    deps: &ServerDeps,
    username: &str,
    event: ActivityEvent,
    group_id: Option<GroupId>,
) {
    let attempts = deps.policy.activity_log_attempts.max(1);

    for attempt in 1..=attempts {
        match deps.activity.log(username, event, group_id).await {
            Ok(()) => {
                debug!(username, ?event, attempt, "Activity recorded");
                return;
            }
            Err(e) if attempt < attempts => {
                warn!(username, ?event, attempt, error = %e, "Activity log write failed, retrying");
                tokio::time::sleep(deps.policy.activity_log_backoff * attempt).await;
            }
            Err(e) => {
                warn!(username, ?event, attempts, error = %e, "Activity log write failed, giving up");
            }
        }
    }
}

/// Activity history of a user, newest first
pub async fn activity_history(
    username: &str,
    deps: &ServerDeps,
) -> Result<Vec<ActivityEntry>, MembershipError> {
    Ok(deps.activity.history(username, HISTORY_LIMIT).await?)
}
