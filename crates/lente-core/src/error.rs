//! # Error Types
//!
//! Domain-specific error types for lente-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lente-core (this file)                                                │
//! │  ├── CoreError        - Settlement rule violations                     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  lente-db             DbError       - storage failures                 │
//! │  lente-gateway        GatewayError  - bank gateway failures            │
//! │                                                                         │
//! │  lente-ledger         ServiceError  - wraps all of the above and       │
//! │                                       exposes a stable error code      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Settlement rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A register session is already open.
    #[error("A cash register is already open ({register_id})")]
    AlreadyOpen { register_id: String },

    /// The operation needs an open register and there is none.
    #[error("No cash register is open")]
    NoOpenRegister,

    /// The payment was already cancelled.
    #[error("Payment {payment_id} is already cancelled")]
    AlreadyCancelled { payment_id: String },

    /// A state machine refused the move.
    ///
    /// ## When This Occurs
    /// - Changing a compensated or rejected check
    /// - Confirming a payment that isn't pending
    /// - Confirming a method that settles at creation
    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Rejecting a check requires a reason.
    #[error("A rejection reason is required")]
    MissingReason,

    /// Open sessions must be closed before they can be deleted.
    #[error("Cash register {register_id} is open and cannot be deleted")]
    CannotDeleteOpenRegister { register_id: String },

    /// Entity does not exist (or is soft-deleted).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Helper to create a NotFound error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Field combination is not accepted.
    #[error("{field}: {reason}")]
    Conflict { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
