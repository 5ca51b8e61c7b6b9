//! # Engine Error Types
//!
//! The caller-facing error taxonomy. Every service operation returns one of
//! these stable kinds; the HTTP layer maps them 1:1 to status codes and
//! never has to inspect lower-layer errors.
//!
//! ## Kind Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  EngineError            HTTP   Meaning                                  │
//! │  ──────────────         ────   ───────────────────────────────────────  │
//! │  Forbidden              403    actor's role may not do this             │
//! │  NotFound               404    product / sale / customer missing        │
//! │  InsufficientStock      400    message carries name + available         │
//! │  Validation             400    malformed input or illegal transition    │
//! │  Conflict               409    sale-number retries exhausted            │
//! │  Timeout                503    budget expired, safe to retry            │
//! │  Storage                500    opaque; detail is logged, never shown    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use mobilia_core::{CoreError, ValidationError};
use mobilia_db::DbError;

/// Errors surfaced by the engine services.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The actor's role does not permit the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Not enough stock to satisfy the cart.
    ///
    /// The message is shown verbatim to the caller, so it carries the
    /// product *name* and the quantity still available.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Malformed input, or a status move the transition table forbids.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation lost a uniqueness race past its retry budget.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The transaction budget expired before commit. Nothing was written;
    /// the caller may retry.
    #[error("operation timed out before commit; safe to retry")]
    Timeout,

    /// Any other storage failure. The wrapped detail goes to the log, the
    /// caller only sees this opaque kind.
    #[error("storage failure")]
    Storage(#[source] DbError),
}

impl EngineError {
    /// Creates a Forbidden error.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        EngineError::Forbidden(reason.into())
    }

    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// The HTTP status an API layer would answer with.
    pub const fn http_status(&self) -> u16 {
        match self {
            EngineError::Forbidden(_) => 403,
            EngineError::NotFound { .. } => 404,
            EngineError::InsufficientStock { .. } | EngineError::Validation(_) => 400,
            EngineError::Conflict(_) => 409,
            EngineError::Timeout => 503,
            EngineError::Storage(_) => 500,
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(err.to_string())
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => EngineError::not_found("Product", id),
            CoreError::SaleNotFound(id) => EngineError::not_found("Sale", id),
            CoreError::InsufficientStock {
                name,
                available,
                requested,
            } => EngineError::InsufficientStock {
                name,
                available,
                requested,
            },
            CoreError::IllegalTransition { .. } => EngineError::Validation(err.to_string()),
            CoreError::Validation(v) => v.into(),
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::UniqueViolation { ref field, .. } => {
                EngineError::Conflict(format!("duplicate {}", field))
            }
            // Pool exhaustion is transient, like a budget expiry.
            DbError::PoolExhausted => EngineError::Timeout,
            other => EngineError::Storage(other),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = EngineError::InsufficientStock {
            name: "Oak Dining Table".to_string(),
            available: 1,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Oak Dining Table: available 1, requested 2"
        );
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_db_error_mapping() {
        let err: EngineError = DbError::not_found("Sale", "s-42").into();
        assert!(matches!(err, EngineError::NotFound { .. }));
        assert_eq!(err.http_status(), 404);

        let err: EngineError = DbError::PoolExhausted.into();
        assert!(matches!(err, EngineError::Timeout));

        let err: EngineError = DbError::QueryFailed("disk I/O error".to_string()).into();
        // Opaque: the message hides the detail
        assert_eq!(err.to_string(), "storage failure");
    }

    #[test]
    fn test_illegal_transition_is_validation() {
        let core = CoreError::IllegalTransition {
            sale_id: "s1".to_string(),
            from: "cancelled".to_string(),
            to: "pending".to_string(),
        };
        let err: EngineError = core.into();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
