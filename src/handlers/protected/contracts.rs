use axum::{
    extract::{rejection::JsonRejection, Path},
    Extension, Json,
};

use crate::auth::Operation;
use crate::database::models::{Contract, ContractInput};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ContractService;

/// GET /api/contracts
pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Contract>> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(ContractService::new().await?.list().await?))
}

/// GET /api/contracts/:id
pub async fn get(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<Contract> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(ContractService::new().await?.get(id).await?))
}

/// GET /api/contracts/number/:number
pub async fn by_number(Extension(user): Extension<AuthUser>, Path(number): Path<String>) -> ApiResult<Contract> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(ContractService::new().await?.by_number(&number).await?))
}

/// GET /api/contracts/country/:country
pub async fn by_country(Extension(user): Extension<AuthUser>, Path(country): Path<String>) -> ApiResult<Vec<Contract>> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(ContractService::new().await?.by_country(&country).await?))
}

/// GET /api/contracts/legal-entity/:entity
pub async fn by_legal_entity(
    Extension(user): Extension<AuthUser>,
    Path(entity): Path<String>,
) -> ApiResult<Vec<Contract>> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(ContractService::new().await?.by_legal_entity(&entity).await?))
}

/// GET /api/contracts/status/:status
pub async fn by_status(Extension(user): Extension<AuthUser>, Path(status): Path<String>) -> ApiResult<Vec<Contract>> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(ContractService::new().await?.by_status(&status).await?))
}

/// POST /api/contracts
pub async fn create(
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ContractInput>, JsonRejection>,
) -> ApiResult<Contract> {
    user.require(Operation::WriteContracts)?;
    let Json(input) = payload?;
    Ok(ApiResponse::created(ContractService::new().await?.create(input).await?))
}

/// PUT /api/contracts/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    payload: Result<Json<ContractInput>, JsonRejection>,
) -> ApiResult<Contract> {
    user.require(Operation::WriteContracts)?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(ContractService::new().await?.update(id, input).await?))
}

/// DELETE /api/contracts/:id
pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<()> {
    user.require(Operation::Delete)?;
    ContractService::new().await?.delete(id).await?;
    Ok(ApiResponse::no_content())
}
