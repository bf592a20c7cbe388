use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Covenant, NewNotification, Notification, UserRoles};
use crate::types::CovenantStatus;

/// Reads and writes the review rules need from the domain store
#[async_trait]
pub trait ComplianceStore: Send + Sync {
    /// Covenants never reviewed, or last reviewed strictly before `cutoff`
    async fn covenants_reviewed_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Covenant>, DatabaseError>;

    /// Covenants whose status label equals `status` exactly
    async fn covenants_with_status(&self, status: &CovenantStatus) -> Result<Vec<Covenant>, DatabaseError>;

    /// Every user with the raw names of the roles they hold
    async fn users_with_roles(&self) -> Result<Vec<UserRoles>, DatabaseError>;

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, DatabaseError>;
}

/// PostgreSQL-backed store using the shared pool
#[derive(Debug, Clone, Copy, Default)]
pub struct PgComplianceStore;

#[async_trait]
impl ComplianceStore for PgComplianceStore {
    async fn covenants_reviewed_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Covenant>, DatabaseError> {
        let pool = DatabaseManager::main_pool().await?;
        let rows = sqlx::query_as::<_, Covenant>(
            "SELECT * FROM covenants WHERE last_monitoring_date IS NULL OR last_monitoring_date < $1 ORDER BY id",
        )
        .bind(cutoff)
        .fetch_all(&pool)
        .await?;
        Ok(rows)
    }

    async fn covenants_with_status(&self, status: &CovenantStatus) -> Result<Vec<Covenant>, DatabaseError> {
        let pool = DatabaseManager::main_pool().await?;
        let rows = sqlx::query_as::<_, Covenant>("SELECT * FROM covenants WHERE status = $1 ORDER BY id")
            .bind(status.as_str())
            .fetch_all(&pool)
            .await?;
        Ok(rows)
    }

    async fn users_with_roles(&self) -> Result<Vec<UserRoles>, DatabaseError> {
        let pool = DatabaseManager::main_pool().await?;
        let rows = sqlx::query_as::<_, UserRoles>(
            r#"
            SELECT u.id, u.username,
                   COALESCE(array_agg(r.name) FILTER (WHERE r.name IS NOT NULL), '{}') AS roles
            FROM users u
            LEFT JOIN user_roles ur ON ur.user_id = u.id
            LEFT JOIN roles r ON r.id = ur.role_id
            GROUP BY u.id, u.username
            ORDER BY u.id
            "#,
        )
        .fetch_all(&pool)
        .await?;
        Ok(rows)
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, DatabaseError> {
        let pool = DatabaseManager::main_pool().await?;
        let row = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, title, message, is_read, created_at)
            VALUES ($1, $2, $3, FALSE, $4)
            RETURNING *
            "#,
        )
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.created_at)
        .fetch_one(&pool)
        .await?;
        Ok(row)
    }
}
