use axum::{extract::rejection::JsonRejection, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, Claims};
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// POST /api/auth/login - exchange credentials for a JWT
pub async fn login(payload: Result<Json<LoginRequest>, JsonRejection>) -> ApiResult<LoginResponse> {
    let Json(request) = payload?;

    let username = request.username.filter(|u| !u.trim().is_empty());
    let password = request.password.filter(|p| !p.is_empty());
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::bad_request("username and password are required"));
    };

    let users = UserService::new().await?;
    let Some(user) = users.authenticate(&username, &password).await? else {
        tracing::warn!("Failed login attempt for '{}'", username);
        return Err(ApiError::unauthorized("Invalid username or password"));
    };

    let claims = Claims::new(user.id, user.username.clone(), user.roles.clone());
    let token = generate_jwt(&claims)?;

    tracing::info!("User '{}' logged in", user.username);
    Ok(ApiResponse::success(LoginResponse {
        token,
        expires_in: claims.expires_in(),
        user,
    }))
}
