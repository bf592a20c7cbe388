use axum::{
    extract::{rejection::JsonRejection, Path},
    Extension, Json,
};

use crate::auth::Operation;
use crate::config;
use crate::database::models::{Covenant, CovenantInput};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::CovenantService;

/// GET /api/covenants
pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Covenant>> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(CovenantService::new().await?.list().await?))
}

/// GET /api/covenants/:id
pub async fn get(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<Covenant> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(CovenantService::new().await?.get(id).await?))
}

/// GET /api/covenants/code/:code
pub async fn by_code(Extension(user): Extension<AuthUser>, Path(code): Path<String>) -> ApiResult<Covenant> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(CovenantService::new().await?.by_code(&code).await?))
}

/// GET /api/covenants/contract/:contract_id
pub async fn by_contract(Extension(user): Extension<AuthUser>, Path(contract_id): Path<i64>) -> ApiResult<Vec<Covenant>> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(CovenantService::new().await?.by_contract(contract_id).await?))
}

/// GET /api/covenants/status/:status
pub async fn by_status(Extension(user): Extension<AuthUser>, Path(status): Path<String>) -> ApiResult<Vec<Covenant>> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(CovenantService::new().await?.by_status(&status).await?))
}

/// GET /api/covenants/due-for-monitoring
pub async fn due_for_monitoring(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Covenant>> {
    user.require(Operation::CovenantsDueForMonitoring)?;
    let months = config::config().scheduler.overdue_months;
    let due = CovenantService::new()
        .await?
        .due_for_monitoring(chrono::Utc::now(), months)
        .await?;
    Ok(ApiResponse::success(due))
}

/// POST /api/covenants
pub async fn create(
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CovenantInput>, JsonRejection>,
) -> ApiResult<Covenant> {
    user.require(Operation::WriteCovenants)?;
    let Json(input) = payload?;
    Ok(ApiResponse::created(CovenantService::new().await?.create(input).await?))
}

/// PUT /api/covenants/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    payload: Result<Json<CovenantInput>, JsonRejection>,
) -> ApiResult<Covenant> {
    user.require(Operation::WriteCovenants)?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(CovenantService::new().await?.update(id, input).await?))
}

/// DELETE /api/covenants/:id
pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<()> {
    user.require(Operation::Delete)?;
    CovenantService::new().await?.delete(id).await?;
    Ok(ApiResponse::no_content())
}
