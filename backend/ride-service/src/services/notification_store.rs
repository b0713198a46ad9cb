use crate::error::Result;
use crate::metrics;
use crate::models::{NewNotification, Notification, UserId};
use async_trait::async_trait;
use sqlx::PgPool;

/// Durable notification records and the unread count derived from them.
///
/// The count is never cached: every push recomputes it here, so what a client
/// sees always reflects the committed state at the time of the push.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Appends a notification and returns its id
    async fn insert(&self, notification: &NewNotification) -> Result<i64>;

    async fn unread_count(&self, user_id: UserId) -> Result<i64>;

    /// Marks every unread notification of the user as read; returns how many changed
    async fn mark_all_read(&self, user_id: UserId) -> Result<u64>;

    async fn list_unread(&self, user_id: UserId) -> Result<Vec<Notification>>;

    async fn list_read(&self, user_id: UserId) -> Result<Vec<Notification>>;
}

pub struct PgNotificationStore {
    db: PgPool,
}

impl PgNotificationStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, notification: &NewNotification) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO messages (text, read, created, route_id, user_id)
            VALUES ($1, FALSE, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&notification.text)
        .bind(notification.created)
        .bind(notification.route_id)
        .bind(notification.user_id)
        .fetch_one(&self.db)
        .await?;

        metrics::record_notification_stored();
        Ok(id)
    }

    async fn unread_count(&self, user_id: UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64> {
        let result =
            sqlx::query("UPDATE messages SET read = TRUE WHERE user_id = $1 AND read = FALSE")
                .bind(user_id)
                .execute(&self.db)
                .await?;
        Ok(result.rows_affected())
    }

    async fn list_unread(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, text, read, created, route_id, user_id
            FROM messages
            WHERE user_id = $1 AND read = FALSE
            ORDER BY created DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_read(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, text, read, created, route_id, user_id
            FROM messages
            WHERE user_id = $1 AND read = TRUE
            ORDER BY created DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
