//! # Engine Error Type
//!
//! Unified error type for the service layer: what callers of checkout,
//! order lifecycle, inventory and register operations see.
//!
//! ## Taxonomy
//! ```text
//! VALIDATION          - malformed input, caught before any write
//! INVALID_STATE       - transition not permitted from current status
//! INVALID_TRANSACTION - inventory ledger input outside allowed range
//! INVALID_REGISTER_OP - register privilege/balance rule violation
//! PERSISTENCE         - storage rejected or could not complete a write
//! PARTIAL_COMPLETION  - multi-step operation committed partially;
//!                       flag the entity for reconciliation, do not
//!                       treat as total failure
//! ```
//! No error is swallowed: every variant carries the entity id and step
//! context needed to reconcile.

use serde::Serialize;
use thiserror::Error;

use vela_core::{CoreError, ValidationError};
use vela_db::DbError;

/// Service-layer error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Domain rule violation from vela-core (validation, state machine,
    /// ledger range, register rules).
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The storage collaborator rejected or could not complete an
    /// operation. Terminal for this invocation; writes are not
    /// idempotent, so callers must not blindly retry.
    #[error("persistence failure: {0}")]
    Persistence(#[from] DbError),

    /// A multi-step operation succeeded partially: the named entity was
    /// durably committed but a follow-up step failed. Operators should
    /// reconcile the entity rather than treat the operation as lost.
    #[error("{entity} {id} committed, but step '{step}' failed: {detail}")]
    PartialCompletion {
        entity: &'static str,
        id: String,
        step: &'static str,
        detail: String,
    },
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Domain(CoreError::Validation(err))
    }
}

impl EngineError {
    /// Machine-readable code for RPC/CLI bindings.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Domain(CoreError::Validation(_))
            | EngineError::Domain(CoreError::CartTooLarge { .. })
            | EngineError::Domain(CoreError::QuantityTooLarge { .. })
            | EngineError::Domain(CoreError::LineNotFound { .. }) => ErrorCode::Validation,
            EngineError::Domain(CoreError::InvalidStateTransition { .. }) => {
                ErrorCode::InvalidState
            }
            EngineError::Domain(CoreError::InvalidTransaction { .. }) => {
                ErrorCode::InvalidTransaction
            }
            EngineError::Domain(CoreError::InvalidRegisterOperation { .. }) => {
                ErrorCode::InvalidRegisterOperation
            }
            EngineError::Persistence(_) => ErrorCode::Persistence,
            EngineError::PartialCompletion { .. } => ErrorCode::PartialCompletion,
        }
    }

    /// Creates a PartialCompletion error.
    pub fn partial_completion(
        entity: &'static str,
        id: impl Into<String>,
        step: &'static str,
        detail: impl ToString,
    ) -> Self {
        EngineError::PartialCompletion {
            entity,
            id: id.into(),
            step,
            detail: detail.to_string(),
        }
    }
}

/// Error codes surfaced to bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Validation,
    InvalidState,
    InvalidTransaction,
    InvalidRegisterOperation,
    Persistence,
    PartialCompletion,
}

/// Result type for service operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_classification() {
        let err: EngineError = ValidationError::EmptyCart.into();
        assert_eq!(err.code(), ErrorCode::Validation);

        let err = EngineError::Domain(CoreError::invalid_transition(
            "Sale", "s-1", "completed", "cancelled",
        ));
        assert_eq!(err.code(), ErrorCode::InvalidState);

        let err = EngineError::Domain(CoreError::invalid_transaction("quantity must be positive"));
        assert_eq!(err.code(), ErrorCode::InvalidTransaction);

        let err = EngineError::Persistence(DbError::not_found("Sale", "s-1"));
        assert_eq!(err.code(), ErrorCode::Persistence);

        let err = EngineError::partial_completion("Sale", "s-1", "occupy_table", "table gone");
        assert_eq!(err.code(), ErrorCode::PartialCompletion);
    }

    #[test]
    fn test_partial_completion_message_names_entity_and_step() {
        let err = EngineError::partial_completion("Sale", "s-42", "release_table", "boom");
        let msg = err.to_string();
        assert!(msg.contains("s-42"));
        assert!(msg.contains("release_table"));
    }
}
