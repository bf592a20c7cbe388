use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::Operation;
use crate::database::models::{MonitoringResult, MonitoringResultInput};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::MonitoringService;

#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// GET /api/monitoring-results
pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<MonitoringResult>> {
    user.require(Operation::ReadMonitoringResults)?;
    Ok(ApiResponse::success(MonitoringService::new().await?.list().await?))
}

/// GET /api/monitoring-results/:id
pub async fn get(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<MonitoringResult> {
    user.require(Operation::ReadMonitoringResults)?;
    Ok(ApiResponse::success(MonitoringService::new().await?.get(id).await?))
}

/// GET /api/monitoring-results/covenant/:covenant_id
pub async fn by_covenant(
    Extension(user): Extension<AuthUser>,
    Path(covenant_id): Path<i64>,
) -> ApiResult<Vec<MonitoringResult>> {
    user.require(Operation::ReadMonitoringResults)?;
    Ok(ApiResponse::success(MonitoringService::new().await?.by_covenant(covenant_id).await?))
}

/// GET /api/monitoring-results/status/:status
pub async fn by_status(Extension(user): Extension<AuthUser>, Path(status): Path<String>) -> ApiResult<Vec<MonitoringResult>> {
    user.require(Operation::ReadMonitoringResults)?;
    Ok(ApiResponse::success(MonitoringService::new().await?.by_status(&status).await?))
}

/// GET /api/monitoring-results/date-range?start=..&end=..
pub async fn in_range(
    Extension(user): Extension<AuthUser>,
    Query(range): Query<DateRange>,
) -> ApiResult<Vec<MonitoringResult>> {
    user.require(Operation::ReadMonitoringResults)?;
    Ok(ApiResponse::success(
        MonitoringService::new().await?.in_range(range.start, range.end).await?,
    ))
}

/// GET /api/monitoring-results/latest/:covenant_id
pub async fn latest(Extension(user): Extension<AuthUser>, Path(covenant_id): Path<i64>) -> ApiResult<MonitoringResult> {
    user.require(Operation::ReadMonitoringResults)?;
    Ok(ApiResponse::success(MonitoringService::new().await?.latest_for(covenant_id).await?))
}

/// POST /api/monitoring-results
///
/// Records the result under the caller's id and moves the covenant to the
/// recorded status.
pub async fn create(
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<MonitoringResultInput>, JsonRejection>,
) -> ApiResult<MonitoringResult> {
    user.require(Operation::WriteMonitoringResults)?;
    let Json(input) = payload?;
    let result = MonitoringService::new()
        .await?
        .record(input, user.user_id, Utc::now())
        .await?;
    Ok(ApiResponse::created(result))
}

/// PUT /api/monitoring-results/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    payload: Result<Json<MonitoringResultInput>, JsonRejection>,
) -> ApiResult<MonitoringResult> {
    user.require(Operation::WriteMonitoringResults)?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(MonitoringService::new().await?.update(id, input).await?))
}

/// DELETE /api/monitoring-results/:id
pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<()> {
    user.require(Operation::Delete)?;
    MonitoringService::new().await?.delete(id).await?;
    Ok(ApiResponse::no_content())
}
