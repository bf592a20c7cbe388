use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::ServiceError;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Covenant, MonitoringResult, MonitoringResultInput};
use crate::database::Repository;

pub struct MonitoringService {
    repo: Repository<MonitoringResult>,
    covenants: Repository<Covenant>,
}

impl MonitoringService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool: PgPool = DatabaseManager::main_pool().await?;
        Ok(Self {
            repo: Repository::new("monitoring_results", pool.clone()),
            covenants: Repository::new("covenants", pool),
        })
    }

    pub async fn list(&self) -> Result<Vec<MonitoringResult>, ServiceError> {
        Ok(self.repo.select_all().await?)
    }

    pub async fn get(&self, id: i64) -> Result<MonitoringResult, ServiceError> {
        self.repo
            .select_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Monitoring result", id))
    }

    pub async fn by_covenant(&self, covenant_id: i64) -> Result<Vec<MonitoringResult>, ServiceError> {
        if !self.covenants.exists(covenant_id).await? {
            return Err(ServiceError::not_found("Covenant", covenant_id));
        }
        Ok(self.repo.select_where("covenant_id", covenant_id).await?)
    }

    pub async fn by_status(&self, status: &str) -> Result<Vec<MonitoringResult>, ServiceError> {
        Ok(self.repo.select_where("status", status).await?)
    }

    /// Results whose monitoring date falls in `[start, end]`
    pub async fn in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<MonitoringResult>, ServiceError> {
        if end < start {
            return Err(ServiceError::Validation {
                field: "end",
                message: "must not be before start".to_string(),
            });
        }
        let rows = sqlx::query_as::<_, MonitoringResult>(
            "SELECT * FROM monitoring_results WHERE monitoring_date BETWEEN $1 AND $2 ORDER BY monitoring_date, id",
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.repo.pool())
        .await?;
        Ok(rows)
    }

    pub async fn latest_for(&self, covenant_id: i64) -> Result<MonitoringResult, ServiceError> {
        sqlx::query_as::<_, MonitoringResult>(
            "SELECT * FROM monitoring_results WHERE covenant_id = $1 ORDER BY monitoring_date DESC, id DESC LIMIT 1",
        )
        .bind(covenant_id)
        .fetch_optional(self.repo.pool())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("No monitoring result for covenant {}", covenant_id)))
    }

    /// Record a result and copy its status onto the covenant.
    ///
    /// Both writes share one transaction; the covenant's last review time
    /// becomes `now`. Concurrent recordings are last-write-wins.
    pub async fn record(
        &self,
        input: MonitoringResultInput,
        author_id: i64,
        now: DateTime<Utc>,
    ) -> Result<MonitoringResult, ServiceError> {
        let mut tx = self.repo.pool().begin().await?;

        let updated = sqlx::query(
            "UPDATE covenants SET status = $2, last_monitoring_date = $3, updated_at = $3 WHERE id = $1",
        )
        .bind(input.covenant_id)
        .bind(input.status.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(ServiceError::not_found("Covenant", input.covenant_id));
        }

        let result = sqlx::query_as::<_, MonitoringResult>(
            r#"
            INSERT INTO monitoring_results (covenant_id, status, monitoring_date, notes, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.covenant_id)
        .bind(input.status.as_str())
        .bind(input.monitoring_date.unwrap_or(now))
        .bind(&input.notes)
        .bind(author_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        if !input.status.is_known() {
            tracing::warn!(
                "Covenant {} recorded with unrecognised status label '{}'",
                input.covenant_id,
                input.status
            );
        }
        tracing::info!("Recorded monitoring result {} for covenant {}", result.id, result.covenant_id);
        Ok(result)
    }

    /// Correct a stored result. The covenant is left as it is and the
    /// original author is kept.
    pub async fn update(&self, id: i64, input: MonitoringResultInput) -> Result<MonitoringResult, ServiceError> {
        sqlx::query_as::<_, MonitoringResult>(
            r#"
            UPDATE monitoring_results
            SET covenant_id = $2, status = $3, monitoring_date = COALESCE($4, monitoring_date), notes = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.covenant_id)
        .bind(input.status.as_str())
        .bind(input.monitoring_date)
        .bind(&input.notes)
        .fetch_optional(self.repo.pool())
        .await?
        .ok_or_else(|| ServiceError::not_found("Monitoring result", id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.repo.delete(id).await?)
    }
}
