//! Ledger domain errors
//!
//! This module defines the error taxonomy shared by every ledger
//! operation. All public operations return a typed result; none recover
//! silently from a failed invariant check.

use thiserror::Error;

/// Errors that can occur in the settlement ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Missing or malformed input (non-positive amount, empty reference,
    /// settlement target that is missing or not pending, edit without a
    /// required reason)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity does not exist
    #[error("Not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Duplicate `(payment_date, reference)` key or duplicate pending
    /// invoice number
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Operation attempted against an invoice or batch in the wrong
    /// lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Storage or transaction failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    /// Creates a not-found error
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        LedgerError::Conflict(message.into())
    }

    /// Creates an invalid-state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        LedgerError::InvalidState(message.into())
    }
}

/// Convenience result alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
