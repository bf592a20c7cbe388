use sqlx::PgPool;

use super::ServiceError;
use crate::database::manager::DatabaseManager;
use crate::database::models::Notification;

/// Per-user inbox. Every call is scoped to a recipient; rows owned by
/// someone else behave as if they did not exist.
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self {
            pool: DatabaseManager::main_pool().await?,
        })
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<Notification>, ServiceError> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn unread(&self, user_id: i64) -> Result<Vec<Notification>, ServiceError> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 AND NOT is_read ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_unread(&self, user_id: i64) -> Result<i64, ServiceError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn mark_as_read(&self, id: i64, user_id: i64) -> Result<Notification, ServiceError> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Notification", id))
    }

    /// Delete a notification. `owner` limits the delete to that recipient;
    /// `None` deletes regardless of owner.
    pub async fn delete(&self, id: i64, owner: Option<i64>) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND ($2::BIGINT IS NULL OR user_id = $2)")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::not_found("Notification", id));
        }
        Ok(())
    }
}
