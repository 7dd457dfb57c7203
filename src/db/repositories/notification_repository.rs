use sqlx::{types::Json, Error, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{NewNotification, Notification};

pub struct NotificationRepository;

impl NotificationRepository {
    pub async fn create_notification(
        pool: &PgPool,
        new_notification: &NewNotification,
    ) -> Result<Notification, Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, title, body, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, body, data, is_read, created_at, read_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_notification.user_id)
        .bind(&new_notification.title)
        .bind(&new_notification.body)
        .bind(Json(&new_notification.data))
        .fetch_one(pool)
        .await
    }

    pub async fn list_notifications_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Notification>, Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, title, body, data, is_read, created_at, read_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Marks a notification read; `None` when it does not exist or belongs to someone else.
    pub async fn mark_notification_read(
        pool: &PgPool,
        notification_id: Uuid,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<Option<Notification>, Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, $3)
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, body, data, is_read, created_at, read_at
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(pool)
        .await
    }
}
