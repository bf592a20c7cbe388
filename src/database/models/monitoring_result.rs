use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::CovenantStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MonitoringResult {
    pub id: i64,
    pub covenant_id: i64,
    pub status: String,
    pub monitoring_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Request body for recording or correcting a monitoring result.
/// The author is always the caller and is never taken from the body.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringResultInput {
    pub covenant_id: i64,
    pub status: CovenantStatus,
    pub monitoring_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}
