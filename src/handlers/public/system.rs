use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Covenant Monitor API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Covenant compliance tracking with scheduled review reminders",
            "endpoints": {
                "auth": "/api/auth/login (public), /api/auth/whoami",
                "contracts": "/api/contracts[/:id]",
                "covenants": "/api/covenants[/:id]",
                "monitoring": "/api/monitoring-results[/:id]",
                "notifications": "/api/notifications",
                "users": "/api/users (ADMIN)",
                "scheduler": "/api/scheduler/rules (ADMIN)",
            }
        }
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
