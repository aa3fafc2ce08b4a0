use chrono::{DateTime, Duration, Utc};

/// Tunable rules of the membership workflow.
#[derive(Debug, Clone)]
pub struct MembershipPolicy {
    /// Membership changes are refused from `date_time - lockout` onwards
    pub lockout: Duration,
    /// Total attempts for a best-effort activity log write
    pub activity_log_attempts: u32,
    /// Retry `n` waits `n * activity_log_backoff`
    pub activity_log_backoff: std::time::Duration,
}

impl Default for MembershipPolicy {
    fn default() -> Self {
        Self {
            lockout: Duration::minutes(60),
            activity_log_attempts: 3,
            activity_log_backoff: std::time::Duration::from_secs(1),
        }
    }
}

impl MembershipPolicy {
    /// Whether membership changes for an event starting at `starts_at` are closed at `now`
    ///
    /// A cutoff that falls outside the representable range counts as closed.
    pub fn window_closed(&self, starts_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        starts_at
            .checked_sub_signed(self.lockout)
            .map_or(true, |cutoff| now >= cutoff)
    }
}
