use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::CovenantStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Covenant {
    pub id: i64,
    pub contract_id: i64,
    pub code: String,
    pub title: String,
    pub has_cure_period: Option<bool>,
    pub contract_article: Option<String>,
    /// Free-form label, copied from the latest monitoring result
    pub status: String,
    pub last_monitoring_date: Option<DateTime<Utc>>,
    pub future_risks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Covenant {
    pub fn status(&self) -> CovenantStatus {
        CovenantStatus::from(self.status.as_str())
    }
}

/// Request body for covenant create/update.
///
/// `last_monitoring_date` is not accepted here: only recording a monitoring
/// result moves it.
#[derive(Debug, Clone, Deserialize)]
pub struct CovenantInput {
    pub contract_id: i64,
    pub code: String,
    pub title: String,
    pub has_cure_period: Option<bool>,
    pub contract_article: Option<String>,
    pub status: Option<CovenantStatus>,
    pub future_risks: Option<String>,
}
