use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::common::{GroupId, MessageId};

/// Longest accepted message body, in characters
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// A chat message posted to a group
#[derive(FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub group_id: GroupId,
    pub username: String,
    pub content: String,
    /// Usernames that have seen this message; the sender is always included
    pub read_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(group_id: GroupId, username: impl Into<String>, content: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            id: MessageId::new(),
            group_id,
            read_by: vec![username.clone()],
            username,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_read_by(&self, username: &str) -> bool {
        self.read_by.iter().any(|u| u == username)
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, group_id, username, content, read_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(self.id)
        .bind(self.group_id)
        .bind(&self.username)
        .bind(&self.content)
        .bind(&self.read_by)
        .bind(self.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn list(
        group_id: GroupId,
        limit: i64,
        before: Option<MessageId>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM messages
             WHERE group_id = $1 AND ($2::uuid IS NULL OR id < $2)
             ORDER BY id DESC
             LIMIT $3",
        )
        .bind(group_id)
        .bind(before)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn mark_read(ids: &[MessageId], username: &str, pool: &PgPool) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            "UPDATE messages SET read_by = array_append(read_by, $2)
             WHERE id = ANY($1) AND NOT ($2 = ANY(read_by))",
        )
        .bind(ids)
        .bind(username)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn unread_count(group_id: GroupId, username: &str, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE group_id = $1 AND NOT ($2 = ANY(read_by))",
        )
        .bind(group_id)
        .bind(username)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
