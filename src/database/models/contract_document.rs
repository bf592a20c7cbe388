use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContractDocument {
    pub id: i64,
    pub contract_id: i64,
    pub document_name: String,
    pub document_type: String,
    pub file_path: String,
    pub upload_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractDocumentInput {
    pub document_name: String,
    pub document_type: String,
    pub file_path: String,
}
