use axum::{
    http::HeaderValue,
    middleware::from_fn,
    routing::{delete, get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::config;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, validate_user_middleware};
use crate::scheduler::SchedulerEngine;

/// Full HTTP surface. The engine is shared with the manual-run endpoints.
pub fn app(engine: Arc<SchedulerEngine>) -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(contract_routes())
        .merge(covenant_routes())
        .merge(monitoring_routes())
        .merge(notification_routes())
        .merge(user_routes())
        .merge(scheduler_routes())
        .layer(
            // Top to bottom: token first, then the user lookup
            ServiceBuilder::new()
                .layer(Extension(engine))
                .layer(from_fn(jwt_auth_middleware))
                .layer(from_fn(validate_user_middleware)),
        );

    let mut router = Router::new()
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .route("/api/auth/login", post(public::auth::login))
        .merge(protected)
        .layer(cors_layer());

    if config().api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn cors_layer() -> CorsLayer {
    let origins = &config().security.cors_origins;
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_routes() -> Router {
    use protected::auth;

    Router::new().route("/api/auth/whoami", get(auth::whoami))
}

fn contract_routes() -> Router {
    use protected::{contract_documents, contracts};

    Router::new()
        .route("/api/contracts", get(contracts::list).post(contracts::create))
        .route(
            "/api/contracts/:id",
            get(contracts::get).put(contracts::update).delete(contracts::delete),
        )
        .route("/api/contracts/number/:number", get(contracts::by_number))
        .route("/api/contracts/country/:country", get(contracts::by_country))
        .route("/api/contracts/legal-entity/:entity", get(contracts::by_legal_entity))
        .route("/api/contracts/status/:status", get(contracts::by_status))
        .route(
            "/api/contracts/:id/documents",
            get(contract_documents::list).post(contract_documents::create),
        )
        .route("/api/contract-documents/:id", delete(contract_documents::delete))
}

fn covenant_routes() -> Router {
    use protected::{covenant_owners, covenants};

    Router::new()
        .route("/api/covenants", get(covenants::list).post(covenants::create))
        .route(
            "/api/covenants/:id",
            get(covenants::get).put(covenants::update).delete(covenants::delete),
        )
        .route("/api/covenants/code/:code", get(covenants::by_code))
        .route("/api/covenants/contract/:contract_id", get(covenants::by_contract))
        .route("/api/covenants/status/:status", get(covenants::by_status))
        .route("/api/covenants/due-for-monitoring", get(covenants::due_for_monitoring))
        .route(
            "/api/covenants/:id/owners",
            get(covenant_owners::list).post(covenant_owners::create),
        )
        .route("/api/covenant-owners/:id", delete(covenant_owners::delete))
}

fn monitoring_routes() -> Router {
    use protected::monitoring_results as results;

    Router::new()
        .route("/api/monitoring-results", get(results::list).post(results::create))
        .route(
            "/api/monitoring-results/:id",
            get(results::get).put(results::update).delete(results::delete),
        )
        .route("/api/monitoring-results/covenant/:covenant_id", get(results::by_covenant))
        .route("/api/monitoring-results/status/:status", get(results::by_status))
        .route("/api/monitoring-results/date-range", get(results::in_range))
        .route("/api/monitoring-results/latest/:covenant_id", get(results::latest))
}

fn notification_routes() -> Router {
    use protected::notifications;

    Router::new()
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/unread", get(notifications::unread))
        .route("/api/notifications/count-unread", get(notifications::count_unread))
        .route("/api/notifications/:id/mark-as-read", put(notifications::mark_as_read))
        .route("/api/notifications/:id", delete(notifications::delete))
}

fn user_routes() -> Router {
    use elevated::users;

    Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", get(users::get).put(users::update).delete(users::delete))
        .route(
            "/api/users/:id/roles/:role",
            put(users::grant_role).delete(users::revoke_role),
        )
}

fn scheduler_routes() -> Router {
    use elevated::scheduler;

    Router::new()
        .route("/api/scheduler/rules", get(scheduler::rules))
        .route("/api/scheduler/rules/:rule/run", post(scheduler::run))
}
