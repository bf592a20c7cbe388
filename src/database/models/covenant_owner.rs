use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CovenantOwner {
    pub id: i64,
    pub covenant_id: i64,
    pub owner_name: String,
    pub owner_unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CovenantOwnerInput {
    pub owner_name: String,
    pub owner_unit: String,
}
