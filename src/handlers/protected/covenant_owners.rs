use axum::{
    extract::{rejection::JsonRejection, Path},
    Extension, Json,
};

use crate::auth::Operation;
use crate::database::models::{CovenantOwner, CovenantOwnerInput};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::OwnerService;

/// GET /api/covenants/:id/owners
pub async fn list(Extension(user): Extension<AuthUser>, Path(covenant_id): Path<i64>) -> ApiResult<Vec<CovenantOwner>> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(OwnerService::new().await?.for_covenant(covenant_id).await?))
}

/// POST /api/covenants/:id/owners
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Path(covenant_id): Path<i64>,
    payload: Result<Json<CovenantOwnerInput>, JsonRejection>,
) -> ApiResult<CovenantOwner> {
    user.require(Operation::WriteCovenants)?;
    let Json(input) = payload?;
    Ok(ApiResponse::created(OwnerService::new().await?.add(covenant_id, input).await?))
}

/// DELETE /api/covenant-owners/:id
pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<()> {
    user.require(Operation::Delete)?;
    OwnerService::new().await?.delete(id).await?;
    Ok(ApiResponse::no_content())
}
