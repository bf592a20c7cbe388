use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{require_text, ServiceError};
use crate::database::manager::DatabaseManager;
use crate::database::models::{Contract, Covenant, CovenantInput};
use crate::database::Repository;
use crate::scheduler::rules::overdue_cutoff;
use crate::scheduler::{ComplianceStore, PgComplianceStore};

pub struct CovenantService {
    repo: Repository<Covenant>,
    contracts: Repository<Contract>,
}

impl CovenantService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(DatabaseManager::main_pool().await?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("covenants", pool.clone()),
            contracts: Repository::new("contracts", pool),
        }
    }

    pub async fn list(&self) -> Result<Vec<Covenant>, ServiceError> {
        Ok(self.repo.select_all().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Covenant, ServiceError> {
        self.repo
            .select_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Covenant", id))
    }

    pub async fn by_code(&self, code: &str) -> Result<Covenant, ServiceError> {
        self.repo
            .select_where("code", code)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::not_found("Covenant", code))
    }

    pub async fn by_contract(&self, contract_id: i64) -> Result<Vec<Covenant>, ServiceError> {
        self.require_contract(contract_id).await?;
        Ok(self.repo.select_where("contract_id", contract_id).await?)
    }

    /// Exact, case-sensitive match on the status label
    pub async fn by_status(&self, status: &str) -> Result<Vec<Covenant>, ServiceError> {
        Ok(self.repo.select_where("status", status).await?)
    }

    /// Same predicate as the overdue review rule, evaluated at `now`
    pub async fn due_for_monitoring(&self, now: DateTime<Utc>, months: u32) -> Result<Vec<Covenant>, ServiceError> {
        Ok(PgComplianceStore
            .covenants_reviewed_before(overdue_cutoff(now, months))
            .await?)
    }

    pub async fn create(&self, input: CovenantInput) -> Result<Covenant, ServiceError> {
        validate(&input)?;
        self.require_contract(input.contract_id).await?;
        let status = input.status.unwrap_or_default();
        let covenant = sqlx::query_as::<_, Covenant>(
            r#"
            INSERT INTO covenants (contract_id, code, title, has_cure_period, contract_article, status, future_risks)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(input.contract_id)
        .bind(&input.code)
        .bind(&input.title)
        .bind(input.has_cure_period)
        .bind(&input.contract_article)
        .bind(status.as_str())
        .bind(&input.future_risks)
        .fetch_one(self.repo.pool())
        .await?;

        tracing::info!("Created covenant {} ({}) on contract {}", covenant.id, covenant.code, covenant.contract_id);
        Ok(covenant)
    }

    /// Edits descriptive fields. An absent status keeps the stored one and
    /// the last review time is never touched here.
    pub async fn update(&self, id: i64, input: CovenantInput) -> Result<Covenant, ServiceError> {
        validate(&input)?;
        self.require_contract(input.contract_id).await?;
        sqlx::query_as::<_, Covenant>(
            r#"
            UPDATE covenants
            SET contract_id = $2, code = $3, title = $4, has_cure_period = $5, contract_article = $6,
                status = COALESCE($7, status), future_risks = $8, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.contract_id)
        .bind(&input.code)
        .bind(&input.title)
        .bind(input.has_cure_period)
        .bind(&input.contract_article)
        .bind(input.status.as_ref().map(|s| s.as_str().to_string()))
        .bind(&input.future_risks)
        .fetch_optional(self.repo.pool())
        .await?
        .ok_or_else(|| ServiceError::not_found("Covenant", id))
    }

    async fn require_contract(&self, contract_id: i64) -> Result<(), ServiceError> {
        if !self.contracts.exists(contract_id).await? {
            return Err(ServiceError::not_found("Contract", contract_id));
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.repo.delete(id).await?;
        tracing::info!("Deleted covenant {}", id);
        Ok(())
    }
}

fn validate(input: &CovenantInput) -> Result<(), ServiceError> {
    require_text("code", &input.code)?;
    require_text("title", &input.title)
}
