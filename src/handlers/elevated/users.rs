use axum::{
    extract::{rejection::JsonRejection, Path},
    Extension, Json,
};

use crate::auth::Operation;
use crate::database::models::{UserInput, UserProfile};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;
use crate::types::Role;

/// GET /api/users
pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<UserProfile>> {
    user.require(Operation::ManageUsers)?;
    Ok(ApiResponse::success(UserService::new().await?.list().await?))
}

/// GET /api/users/:id
pub async fn get(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<UserProfile> {
    user.require(Operation::ManageUsers)?;
    Ok(ApiResponse::success(UserService::new().await?.get(id).await?))
}

/// POST /api/users
pub async fn create(
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> ApiResult<UserProfile> {
    user.require(Operation::ManageUsers)?;
    let Json(input) = payload?;
    let created = UserService::new().await?.create(input).await?;
    tracing::info!("User '{}' created by '{}'", created.username, user.username);
    Ok(ApiResponse::created(created))
}

/// PUT /api/users/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> ApiResult<UserProfile> {
    user.require(Operation::ManageUsers)?;
    let Json(input) = payload?;
    Ok(ApiResponse::success(UserService::new().await?.update(id, input).await?))
}

/// DELETE /api/users/:id
pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<()> {
    user.require(Operation::ManageUsers)?;
    UserService::new().await?.delete(id).await?;
    Ok(ApiResponse::no_content())
}

/// PUT /api/users/:id/roles/:role
pub async fn grant_role(
    Extension(user): Extension<AuthUser>,
    Path((id, role)): Path<(i64, String)>,
) -> ApiResult<UserProfile> {
    user.require(Operation::ManageUsers)?;
    let role = parse_role(&role)?;
    Ok(ApiResponse::success(UserService::new().await?.grant_role(id, role).await?))
}

/// DELETE /api/users/:id/roles/:role
pub async fn revoke_role(
    Extension(user): Extension<AuthUser>,
    Path((id, role)): Path<(i64, String)>,
) -> ApiResult<UserProfile> {
    user.require(Operation::ManageUsers)?;
    let role = parse_role(&role)?;
    Ok(ApiResponse::success(UserService::new().await?.revoke_role(id, role).await?))
}

fn parse_role(name: &str) -> Result<Role, ApiError> {
    Role::from_name(name).ok_or_else(|| ApiError::invalid_field("role", format!("unknown role '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_path_accepts_prefixed_and_bare_names() {
        assert_eq!(parse_role("ROLE_FINANCE_COUNTRY").unwrap(), Role::FinanceCountry);
        assert_eq!(parse_role("ADMIN").unwrap(), Role::Admin);
        assert_eq!(parse_role("AUDITOR").unwrap_err().status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
