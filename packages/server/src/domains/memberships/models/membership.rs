use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::common::GroupId;

/// Status of a persisted membership row.
///
/// "No membership" is the absence of a row, never a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Pending,
    Approved,
    Rejected,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Approved => "approved",
            MembershipStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's membership in one group. `(group_id, username)` is the primary key.
#[derive(FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub group_id: GroupId,
    pub username: String,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(
        group_id: GroupId,
        username: impl Into<String>,
        status: MembershipStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id,
            username: username.into(),
            status,
            joined_at: now,
            updated_at: now,
        }
    }

    /// Find a membership row
    pub async fn find(
        group_id: GroupId,
        username: &str,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM group_members WHERE group_id = $1 AND username = $2",
        )
        .bind(group_id)
        .bind(username)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Insert or overwrite the row for `(group_id, username)`
    ///
    /// The composite primary key guarantees one row per pair; a re-request
    /// after rejection overwrites status and both timestamps.
    pub async fn upsert(membership: &Membership, conn: &mut PgConnection) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, username, status, joined_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (group_id, username) DO UPDATE
            SET status = EXCLUDED.status,
                joined_at = EXCLUDED.joined_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(membership.group_id)
        .bind(&membership.username)
        .bind(membership.status)
        .bind(membership.joined_at)
        .bind(membership.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Delete a membership row, returning whether one existed
    pub async fn delete(group_id: GroupId, username: &str, conn: &mut PgConnection) -> Result<bool> {
        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND username = $2")
            .bind(group_id)
            .bind(username)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count rows of a group with the given status
    pub async fn count_by_status(
        group_id: GroupId,
        status: MembershipStatus,
        conn: &mut PgConnection,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM group_members WHERE group_id = $1 AND status = $2",
        )
        .bind(group_id)
        .bind(status)
        .fetch_one(conn)
        .await?;

        Ok(count)
    }

    /// List rows of a group with the given status, oldest request first
    pub async fn list_by_status(
        group_id: GroupId,
        status: MembershipStatus,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM group_members
             WHERE group_id = $1 AND status = $2
             ORDER BY joined_at ASC, username ASC",
        )
        .bind(group_id)
        .bind(status)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// List every row of a group regardless of status
    pub async fn list_for_group(group_id: GroupId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM group_members WHERE group_id = $1 ORDER BY joined_at ASC, username ASC",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
