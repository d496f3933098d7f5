use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::notification::Notification;
use crate::database::Database;
use crate::domain::pagination::{Page, PageParams};
use crate::services::ServiceError;

pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool = Database::pool().await?;
        Ok(Self { pool })
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        kind: &str,
        message: &str,
        resource_type: Option<&str>,
        resource_id: Option<Uuid>,
    ) -> Result<Notification, ServiceError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, message, resource_type, resource_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(message)
        .bind(resource_type)
        .bind(resource_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    /// List the caller's own notifications, newest first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        params: PageParams,
    ) -> Result<Page<Notification>, ServiceError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, params, total))
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Mark one notification read. Owner-only: a foreign id is a 404, not
    /// a 403, so ids cannot be probed.
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<Notification, ServiceError> {
        let updated = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Notification not found"))?;

        Ok(updated)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}
