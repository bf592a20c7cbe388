use axum::{extract::Request, middleware::Next, response::Response};

use super::auth::AuthUser;
use crate::database::manager::DatabaseManager;
use crate::database::models::UserRoles;
use crate::error::ApiError;
use crate::types::Role;

/// Middleware that re-checks the JWT subject against the users table.
///
/// The user must still exist and be enabled. Roles are reloaded from the
/// database so that revocations take effect before the token expires.
pub async fn validate_user_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let pool = DatabaseManager::main_pool().await?;

    let row: Option<(bool, UserRoles)> = sqlx::query_as::<_, (bool, i64, String, Vec<String>)>(
        r#"
        SELECT u.enabled, u.id, u.username,
               COALESCE(array_agg(r.name) FILTER (WHERE r.name IS NOT NULL), '{}') AS roles
        FROM users u
        LEFT JOIN user_roles ur ON ur.user_id = u.id
        LEFT JOIN roles r ON r.id = ur.role_id
        WHERE u.id = $1
        GROUP BY u.id
        "#,
    )
    .bind(auth_user.user_id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error validating user {}: {}", auth_user.user_id, e);
        ApiError::internal_server_error("Failed to validate user")
    })?
    .map(|(enabled, id, username, roles)| (enabled, UserRoles { id, username, roles }));

    let (enabled, stored) = row.ok_or_else(|| {
        tracing::warn!("User validation failed: user '{}' (ID: {}) not found", auth_user.username, auth_user.user_id);
        ApiError::unauthorized("User no longer exists")
    })?;

    if !enabled {
        tracing::warn!("User validation failed: user '{}' is disabled", stored.username);
        return Err(ApiError::unauthorized("User account is disabled"));
    }

    if stored.username != auth_user.username {
        tracing::warn!(
            "User validation failed: JWT user '{}' doesn't match database user '{}'",
            auth_user.username,
            stored.username
        );
        return Err(ApiError::unauthorized("User authentication mismatch"));
    }

    let validated = AuthUser {
        user_id: stored.id,
        username: stored.username,
        roles: Role::parse_all(&stored.roles),
    };

    tracing::debug!("User validation successful: {} with roles {:?}", validated.username, validated.roles);

    request.extensions_mut().insert(validated);

    Ok(next.run(request).await)
}
