use axum::{extract::Path, Extension};
use serde::Serialize;

use crate::database::models::Notification;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::NotificationService;
use crate::types::Role;

// Notifications are scoped to the caller; no role check beyond authentication.

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

/// GET /api/notifications
pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Notification>> {
    Ok(ApiResponse::success(NotificationService::new().await?.list(user.user_id).await?))
}

/// GET /api/notifications/unread
pub async fn unread(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Notification>> {
    Ok(ApiResponse::success(NotificationService::new().await?.unread(user.user_id).await?))
}

/// GET /api/notifications/count-unread
pub async fn count_unread(Extension(user): Extension<AuthUser>) -> ApiResult<UnreadCount> {
    let count = NotificationService::new().await?.count_unread(user.user_id).await?;
    Ok(ApiResponse::success(UnreadCount { count }))
}

/// PUT /api/notifications/:id/mark-as-read
pub async fn mark_as_read(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<Notification> {
    let notification = NotificationService::new().await?.mark_as_read(id, user.user_id).await?;
    Ok(ApiResponse::success(notification))
}

/// DELETE /api/notifications/:id
///
/// Admins may delete any notification, everyone else only their own.
pub async fn delete(Extension(user): Extension<AuthUser>, Path(id): Path<i64>) -> ApiResult<()> {
    let owner = if user.has_role(Role::Admin) { None } else { Some(user.user_id) };
    NotificationService::new().await?.delete(id, owner).await?;
    Ok(ApiResponse::no_content())
}
