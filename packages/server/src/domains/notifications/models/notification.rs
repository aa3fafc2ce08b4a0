use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::common::{GroupId, NotificationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    JoinRequest,
    JoinApproved,
    JoinRejected,
    LeaveGroup,
    MemberJoined,
    RemovedFromGroup,
    UnreadMessages,
}

/// In-app notification. Only `read` ever changes after creation.
#[derive(FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_username: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub group_id: Option<GroupId>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a notification
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_username: String,
    pub notification_type: NotificationType,
    pub message: String,
    pub group_id: Option<GroupId>,
}

impl NewNotification {
    pub fn new(
        recipient: impl Into<String>,
        notification_type: NotificationType,
        message: impl Into<String>,
        group_id: GroupId,
    ) -> Self {
        Self {
            recipient_username: recipient.into(),
            notification_type,
            message: message.into(),
            group_id: Some(group_id),
        }
    }

    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: NotificationId::new(),
            recipient_username: self.recipient_username,
            notification_type: self.notification_type,
            message: self.message,
            group_id: self.group_id,
            read: false,
            created_at: now,
        }
    }
}

impl Notification {
    pub async fn insert(new: NewNotification, pool: &PgPool) -> Result<Self> {
        let notification = new.into_notification(Utc::now());

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO notifications (id, recipient_username, type, message, group_id, read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(notification.id)
        .bind(&notification.recipient_username)
        .bind(notification.notification_type)
        .bind(&notification.message)
        .bind(notification.group_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert an unread `unread_messages` notification unless one is already open.
    ///
    /// The partial unique index on `(recipient_username, group_id)` for unread
    /// `unread_messages` rows turns a concurrent duplicate into a no-op.
    pub async fn insert_unread_messages_if_absent(
        recipient: &str,
        group_id: GroupId,
        message: &str,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_username, type, message, group_id, read, created_at)
            VALUES ($1, $2, 'unread_messages', $3, $4, FALSE, NOW())
            ON CONFLICT (recipient_username, group_id)
                WHERE type = 'unread_messages' AND NOT read
            DO NOTHING
            "#,
        )
        .bind(NotificationId::new())
        .bind(recipient)
        .bind(message)
        .bind(group_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_recipient(
        recipient: &str,
        unread_only: bool,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM notifications
             WHERE recipient_username = $1 AND ($2 = FALSE OR read = FALSE)
             ORDER BY created_at DESC, id DESC
             LIMIT $3",
        )
        .bind(recipient)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn unread_count(recipient: &str, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_username = $1 AND read = FALSE",
        )
        .bind(recipient)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn mark_read(id: NotificationId, recipient: &str, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND recipient_username = $2",
        )
        .bind(id)
        .bind(recipient)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
