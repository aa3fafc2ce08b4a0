use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::common::{ActivityLogId, GroupId};

/// Events recorded in a user's activity history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_event", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    CreateGroup,
    DeleteGroup,
    JoinGroupRequest,
    JoinGroupApproved,
    JoinGroupRejected,
    LeaveGroup,
    RemoveMember,
    SendMessage,
}

#[derive(FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityLogId,
    pub username: String,
    pub event_type: ActivityEvent,
    pub group_id: Option<GroupId>,
    pub created_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(username: impl Into<String>, event_type: ActivityEvent, group_id: Option<GroupId>) -> Self {
        Self {
            id: ActivityLogId::new(),
            username: username.into(),
            event_type,
            group_id,
            created_at: Utc::now(),
        }
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "INSERT INTO activity_logs (id, username, event_type, group_id, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(self.id)
        .bind(&self.username)
        .bind(self.event_type)
        .bind(self.group_id)
        .bind(self.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn history(username: &str, limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM activity_logs WHERE username = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(username)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
