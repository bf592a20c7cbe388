use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contract {
    pub id: i64,
    pub contract_number: String,
    pub legal_entity: String,
    pub country: String,
    pub contract_type: String,
    pub amount: Decimal,
    pub currency: String,
    pub counterparty: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub has_guarantee: Option<bool>,
    pub guarantee_company: Option<String>,
    pub additional_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for contract create/update
#[derive(Debug, Clone, Deserialize)]
pub struct ContractInput {
    pub contract_number: String,
    pub legal_entity: String,
    pub country: String,
    pub contract_type: String,
    pub amount: Decimal,
    pub currency: String,
    pub counterparty: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub has_guarantee: Option<bool>,
    pub guarantee_company: Option<String>,
    pub additional_info: Option<String>,
}
