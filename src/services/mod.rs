use thiserror::Error;

use crate::database::manager::DatabaseError;

pub mod contract_service;
pub mod covenant_service;
pub mod document_service;
pub mod monitoring_service;
pub mod notification_service;
pub mod owner_service;
pub mod user_service;

pub use contract_service::ContractService;
pub use covenant_service::CovenantService;
pub use document_service::DocumentService;
pub use monitoring_service::MonitoringService;
pub use notification_service::NotificationService;
pub use owner_service::OwnerService;
pub use user_service::UserService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Database(DatabaseError),
}

impl ServiceError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} {} not found", what, id))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or("unique key");
                    return ServiceError::Conflict(format!("Duplicate value violates {}", constraint));
                }
                // foreign_key_violation
                Some("23503") => {
                    return ServiceError::Conflict("Record is referenced by, or references, missing data".to_string());
                }
                _ => {}
            }
        }
        ServiceError::Database(DatabaseError::Sqlx(err))
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            DatabaseError::Sqlx(sqlx_err) => sqlx_err.into(),
            other => ServiceError::Database(other),
        }
    }
}

/// Reject empty or whitespace-only required text
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation {
            field,
            message: "must not be blank".to_string(),
        });
    }
    Ok(())
}
