// Protected handlers: every route here runs behind jwt_auth_middleware and
// validate_user_middleware, so handlers receive a current AuthUser.
// Role checks happen per handler against the operation table.
pub mod auth;
pub mod contract_documents;
pub mod contracts;
pub mod covenant_owners;
pub mod covenants;
pub mod monitoring_results;
pub mod notifications;
