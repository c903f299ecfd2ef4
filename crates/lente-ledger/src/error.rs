//! # Service Error Type
//!
//! The single error type returned by every settlement operation.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ─┐                                                     │
//! │  CoreError ───────┤                                                     │
//! │  DbError ─────────┼──► ServiceError ──► code() ──► HTTP status mapping │
//! │  GatewayError ────┘         │                                           │
//! │                             └──► to_body() ──► {code, message, details}│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Codes
//! ```json
//! { "code": "NO_OPEN_REGISTER", "message": "No cash register is open" }
//! ```

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use lente_core::{CoreError, ValidationError};
use lente_db::DbError;
use lente_gateway::GatewayError;

/// Machine-readable error codes, one per error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input rejected before anything was written (400)
    ValidationError,
    /// A register session is already open (409)
    AlreadyOpen,
    /// Operation needs an open register (409)
    NoOpenRegister,
    /// Payment already cancelled (409)
    AlreadyCancelled,
    /// State machine refused the move (409)
    InvalidTransition,
    /// Check rejection without a reason (400)
    MissingReason,
    /// Entity missing or soft-deleted (404)
    NotFound,
    /// Boleto gateway failure (502)
    GatewayError,
    /// Open sessions can't be deleted (409)
    CannotDeleteOpenRegister,
    /// Concurrent writers kept winning the compare-and-set (409, retryable)
    Conflict,
    /// Storage failure (500)
    DatabaseError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::AlreadyOpen => "ALREADY_OPEN",
            ErrorCode::NoOpenRegister => "NO_OPEN_REGISTER",
            ErrorCode::AlreadyCancelled => "ALREADY_CANCELLED",
            ErrorCode::InvalidTransition => "INVALID_TRANSITION",
            ErrorCode::MissingReason => "MISSING_REASON",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::GatewayError => "GATEWAY_ERROR",
            ErrorCode::CannotDeleteOpenRegister => "CANNOT_DELETE_OPEN_REGISTER",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("A cash register is already open ({register_id})")]
    AlreadyOpen { register_id: String },

    #[error("No cash register is open")]
    NoOpenRegister,

    #[error("Payment {payment_id} is already cancelled")]
    AlreadyCancelled { payment_id: String },

    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("A rejection reason is required")]
    MissingReason,

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Boleto gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Cash register {register_id} is open and cannot be deleted")]
    CannotDeleteOpenRegister { register_id: String },

    #[error("{entity} {id} was modified concurrently, retry the operation")]
    Conflict { entity: &'static str, id: String },

    #[error("Database error: {0}")]
    Database(DbError),
}

/// Result type for settlement operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Serialized form handed to the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ServiceError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Validation(_) => ErrorCode::ValidationError,
            ServiceError::AlreadyOpen { .. } => ErrorCode::AlreadyOpen,
            ServiceError::NoOpenRegister => ErrorCode::NoOpenRegister,
            ServiceError::AlreadyCancelled { .. } => ErrorCode::AlreadyCancelled,
            ServiceError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            ServiceError::MissingReason => ErrorCode::MissingReason,
            ServiceError::NotFound { .. } => ErrorCode::NotFound,
            ServiceError::Gateway(_) => ErrorCode::GatewayError,
            ServiceError::CannotDeleteOpenRegister { .. } => ErrorCode::CannotDeleteOpenRegister,
            ServiceError::Conflict { .. } => ErrorCode::Conflict,
            ServiceError::Database(_) => ErrorCode::DatabaseError,
        }
    }

    /// Body for the HTTP layer. Database internals are not exposed; gateway
    /// errors keep their own code and details for manual reconciliation.
    pub fn to_body(&self) -> ErrorBody {
        match self {
            ServiceError::Database(e) => {
                tracing::error!(error = %e, "Database operation failed");
                ErrorBody {
                    code: ErrorCode::DatabaseError,
                    message: "Database operation failed".to_string(),
                    details: None,
                }
            }
            ServiceError::Gateway(e) => ErrorBody {
                code: ErrorCode::GatewayError,
                message: self.to_string(),
                details: Some(serde_json::json!({
                    "gateway_code": e.code,
                    "gateway_details": e.details,
                })),
            },
            other => ErrorBody {
                code: other.code(),
                message: other.to_string(),
                details: None,
            },
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AlreadyOpen { register_id } => ServiceError::AlreadyOpen { register_id },
            CoreError::NoOpenRegister => ServiceError::NoOpenRegister,
            CoreError::AlreadyCancelled { payment_id } => {
                ServiceError::AlreadyCancelled { payment_id }
            }
            CoreError::InvalidTransition { entity, from, to } => {
                ServiceError::InvalidTransition { entity, from, to }
            }
            CoreError::MissingReason => ServiceError::MissingReason,
            CoreError::CannotDeleteOpenRegister { register_id } => {
                ServiceError::CannotDeleteOpenRegister { register_id }
            }
            CoreError::NotFound { entity, id } => ServiceError::not_found(entity, id),
            CoreError::Validation(e) => ServiceError::Validation(e),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            other => ServiceError::Database(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ServiceError::NoOpenRegister.code().as_str(), "NO_OPEN_REGISTER");
        assert_eq!(
            ServiceError::from(CoreError::MissingReason).code(),
            ErrorCode::MissingReason
        );
        assert_eq!(
            ServiceError::from(DbError::not_found("payment", "p1")).code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            ServiceError::from(DbError::PoolExhausted).code(),
            ErrorCode::DatabaseError
        );

        let json = serde_json::to_value(ErrorCode::CannotDeleteOpenRegister).unwrap();
        assert_eq!(json, "CANNOT_DELETE_OPEN_REGISTER");
    }

    #[test]
    fn test_body_hides_database_detail() {
        let err = ServiceError::from(DbError::QueryFailed("near \"SELEC\": syntax error".into()));
        let body = err.to_body();
        assert_eq!(body.code, ErrorCode::DatabaseError);
        assert!(!body.message.contains("SELEC"));
    }

    #[test]
    fn test_body_keeps_gateway_detail() {
        let gateway = GatewayError::from_status(422, r#"{"mensagem":"CPF inválido"}"#);
        let body = ServiceError::from(gateway).to_body();
        assert_eq!(body.code, ErrorCode::GatewayError);
        let details = body.details.unwrap();
        assert_eq!(details["gateway_code"], "REJECTED");
        assert_eq!(details["gateway_details"]["body"]["mensagem"], "CPF inválido");
    }
}
