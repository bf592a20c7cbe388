use axum::{
    extract::{rejection::JsonRejection, Path},
    Extension, Json,
};

use crate::auth::Operation;
use crate::database::models::{ContractDocument, ContractDocumentInput};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::DocumentService;

/// GET /api/contracts/:id/documents
pub async fn list(Extension(user): Extension<AuthUser>, Path(contract_id): Path<i64>) -> ApiResult<Vec<ContractDocument>> {
    user.require(Operation::ReadContracts)?;
    Ok(ApiResponse::success(DocumentService::new().await?.for_contract(contract_id).await?))
}

/// POST /api/contracts/:id/documents
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Path(contract_id): Path<i64>,
    payload: Result<Json<ContractDocumentInput>, JsonRejection>,
) -> ApiResult<ContractDocument> {
    user.require(Operation::WriteContracts)?;
    let Json(input) = payload?;
    Ok(ApiResponse::created(DocumentService::new().await?.add(contract_id, input).await?))
}

/// DELETE /api/contract-documents/:id
pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<()> {
    user.require(Operation::Delete)?;
    DocumentService::new().await?.delete(id).await?;
    Ok(ApiResponse::no_content())
}
