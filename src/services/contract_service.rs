use sqlx::PgPool;

use super::{require_text, ServiceError};
use crate::database::manager::DatabaseManager;
use crate::database::models::{Contract, ContractInput};
use crate::database::Repository;

pub struct ContractService {
    repo: Repository<Contract>,
}

impl ContractService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(DatabaseManager::main_pool().await?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("contracts", pool),
        }
    }

    pub async fn list(&self) -> Result<Vec<Contract>, ServiceError> {
        Ok(self.repo.select_all().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Contract, ServiceError> {
        self.repo
            .select_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contract", id))
    }

    pub async fn by_number(&self, number: &str) -> Result<Contract, ServiceError> {
        self.repo
            .select_where("contract_number", number)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::not_found("Contract", number))
    }

    pub async fn by_country(&self, country: &str) -> Result<Vec<Contract>, ServiceError> {
        Ok(self.repo.select_where("country", country).await?)
    }

    pub async fn by_legal_entity(&self, legal_entity: &str) -> Result<Vec<Contract>, ServiceError> {
        Ok(self.repo.select_where("legal_entity", legal_entity).await?)
    }

    pub async fn by_status(&self, status: &str) -> Result<Vec<Contract>, ServiceError> {
        Ok(self.repo.select_where("status", status).await?)
    }

    pub async fn create(&self, input: ContractInput) -> Result<Contract, ServiceError> {
        validate(&input)?;
        let contract = sqlx::query_as::<_, Contract>(
            r#"
            INSERT INTO contracts (contract_number, legal_entity, country, contract_type, amount, currency,
                                   counterparty, status, start_date, end_date, has_guarantee,
                                   guarantee_company, additional_info)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&input.contract_number)
        .bind(&input.legal_entity)
        .bind(&input.country)
        .bind(&input.contract_type)
        .bind(input.amount)
        .bind(&input.currency)
        .bind(&input.counterparty)
        .bind(&input.status)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.has_guarantee)
        .bind(&input.guarantee_company)
        .bind(&input.additional_info)
        .fetch_one(self.repo.pool())
        .await?;

        tracing::info!("Created contract {} ({})", contract.id, contract.contract_number);
        Ok(contract)
    }

    pub async fn update(&self, id: i64, input: ContractInput) -> Result<Contract, ServiceError> {
        validate(&input)?;
        sqlx::query_as::<_, Contract>(
            r#"
            UPDATE contracts
            SET contract_number = $2, legal_entity = $3, country = $4, contract_type = $5, amount = $6,
                currency = $7, counterparty = $8, status = $9, start_date = $10, end_date = $11,
                has_guarantee = $12, guarantee_company = $13, additional_info = $14, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.contract_number)
        .bind(&input.legal_entity)
        .bind(&input.country)
        .bind(&input.contract_type)
        .bind(input.amount)
        .bind(&input.currency)
        .bind(&input.counterparty)
        .bind(&input.status)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.has_guarantee)
        .bind(&input.guarantee_company)
        .bind(&input.additional_info)
        .fetch_optional(self.repo.pool())
        .await?
        .ok_or_else(|| ServiceError::not_found("Contract", id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.repo.delete(id).await?;
        tracing::info!("Deleted contract {}", id);
        Ok(())
    }
}

fn validate(input: &ContractInput) -> Result<(), ServiceError> {
    require_text("contract_number", &input.contract_number)?;
    require_text("legal_entity", &input.legal_entity)?;
    require_text("currency", &input.currency)?;
    if input.end_date < input.start_date {
        return Err(ServiceError::Validation {
            field: "end_date",
            message: "must not be before start_date".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn input() -> ContractInput {
        ContractInput {
            contract_number: "CTR-2025-001".into(),
            legal_entity: "Holding SpA".into(),
            country: "IT".into(),
            contract_type: "LOAN".into(),
            amount: Decimal::new(1_500_000_00, 2),
            currency: "EUR".into(),
            counterparty: "Banca Esempio".into(),
            status: "ACTIVE".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            has_guarantee: Some(true),
            guarantee_company: None,
            additional_info: None,
        }
    }

    #[test]
    fn accepts_well_formed_input() {
        assert!(validate(&input()).is_ok());
    }

    #[test]
    fn rejects_inverted_dates() {
        let mut bad = input();
        bad.end_date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert!(matches!(validate(&bad), Err(ServiceError::Validation { field: "end_date", .. })));
    }
}
