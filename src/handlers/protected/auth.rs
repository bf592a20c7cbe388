use axum::Extension;

use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;

/// GET /api/auth/whoami - the caller's profile and current roles
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<UserProfile> {
    let profile = UserService::new().await?.get(user.user_id).await?;
    Ok(ApiResponse::success(profile))
}
