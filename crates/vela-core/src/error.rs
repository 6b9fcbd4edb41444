//! # Error Types
//!
//! Domain-specific error types for vela-core.
//!
//! ## Error Hierarchy
//! ```text
//! vela-core errors (this file)
//! ├── ValidationError  - Input validation failures (caught before any write)
//! └── CoreError        - Domain rule violations (state machine, ledger, till)
//!
//! vela-db errors (separate crate)
//! └── DbError          - Database operation failures
//!
//! vela-engine errors
//! └── EngineError      - What callers of the services see
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (entity, id, current status)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input does not meet requirements and are always
/// raised before any write happens. Fully recoverable by correcting input.
#[derive(Debug, Error)]
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

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Checkout was attempted with no line items.
    #[error("cart is empty")]
    EmptyCart,

    /// A dine-in sale was attempted without a table.
    #[error("dine-in sales require a table")]
    TableRequired,
}

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations.
///
/// These represent attempts to do something the business rules forbid from
/// the current state, as opposed to malformed input.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Attempted state change not permitted from the current status.
    ///
    /// Raised by the sale/order lifecycle and by table status changes.
    /// The operation has no side effects when this is returned.
    #[error("{entity} {id} is {current}, cannot transition to {requested}")]
    InvalidStateTransition {
        entity: &'static str,
        id: String,
        current: String,
        requested: String,
    },

    /// Inventory ledger input outside the allowed range, or a movement
    /// against a product/business pairing that does not exist.
    #[error("invalid inventory transaction: {reason}")]
    InvalidTransaction { reason: String },

    /// Cash register operation not permitted (closing a non-open session,
    /// negative closing balance, missing privilege).
    #[error("invalid register operation on session {session_id}: {reason}")]
    InvalidRegisterOperation { session_id: String, reason: String },

    /// Cart has exceeded maximum allowed lines.
    #[error("cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Cart operation referenced a product that is not in the cart.
    #[error("product {product_id} is not in the cart")]
    LineNotFound { product_id: String },
}

impl CoreError {
    /// Creates an InvalidStateTransition error.
    pub fn invalid_transition(
        entity: &'static str,
        id: impl Into<String>,
        current: impl Into<String>,
        requested: impl Into<String>,
    ) -> Self {
        CoreError::InvalidStateTransition {
            entity,
            id: id.into(),
            current: current.into(),
            requested: requested.into(),
        }
    }

    /// Creates an InvalidTransaction error.
    pub fn invalid_transaction(reason: impl Into<String>) -> Self {
        CoreError::InvalidTransaction {
            reason: reason.into(),
        }
    }

    /// Creates an InvalidRegisterOperation error.
    pub fn invalid_register_op(session_id: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidRegisterOperation {
            session_id: session_id.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
