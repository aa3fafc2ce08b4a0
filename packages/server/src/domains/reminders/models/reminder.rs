use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::GroupId;

/// Which pre-event reminder a member receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reminder_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DayBefore,
    HourBefore,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 2] = [ReminderKind::DayBefore, ReminderKind::HourBefore];

    /// How long before the event this reminder goes out
    pub fn lead(&self) -> Duration {
        match self {
            ReminderKind::DayBefore => Duration::hours(24),
            ReminderKind::HourBefore => Duration::hours(1),
        }
    }

    /// Due while the event is at most `lead` and more than `lead - slack` away.
    ///
    /// `slack` must exceed the polling interval or a window can be skipped.
    pub fn is_due(&self, starts_at: DateTime<Utc>, now: DateTime<Utc>, slack: Duration) -> bool {
        let until = starts_at - now;
        until <= self.lead() && until > self.lead() - slack
    }
}

/// Ledger of reminders already sent
pub struct ReminderSent;

impl ReminderSent {
    /// Record a reminder as sent. `false` if it was already recorded.
    pub async fn claim(
        group_id: GroupId,
        username: &str,
        kind: ReminderKind,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO reminders_sent (group_id, username, kind, sent_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (group_id, username, kind) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(username)
        .bind(kind)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Forget a claim so the next pass retries it
    pub async fn release(
        group_id: GroupId,
        username: &str,
        kind: ReminderKind,
        pool: &PgPool,
    ) -> Result<()> {
        sqlx::query("DELETE FROM reminders_sent WHERE group_id = $1 AND username = $2 AND kind = $3")
            .bind(group_id)
            .bind(username)
            .bind(kind)
            .execute(pool)
            .await?;

        Ok(())
    }
}
