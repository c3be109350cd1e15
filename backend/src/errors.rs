//! # Error Types
//!
//! Every failure in the bank backend is reported as a [`BankError`].
//! Callers branch on [`BankError::kind`] instead of matching message text.
//!
//! ## Error Categories
//!
//! | Kind | Variants | Retry? |
//! |------|----------|--------|
//! | `NotFound` | `NotFound` | no |
//! | `InvalidArgument` | `InvalidArgument`, `InsufficientFunds` | no |
//! | `Transient` | `Conflict`, `Timeout` | yes, by the caller |
//! | `Internal` | `Internal` | no |
//!
//! ## Mapping Storage Errors
//!
//! PostgreSQL reports conflicts through SQLSTATE codes:
//!
//! - `40001` serialization_failure → `Conflict`
//! - `40P01` deadlock_detected → `Conflict`
//! - `55P03` lock_not_available → `Conflict`
//! - `23503` foreign_key_violation → `NotFound`
//! - `22003` numeric_value_out_of_range → `InvalidArgument`
//!
//! Everything else coming out of the driver is `Internal`.

use std::time::Duration;

use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Classification of a [`BankError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced record does not exist.
    NotFound,
    /// The request itself is unacceptable.
    InvalidArgument,
    /// The operation may succeed if retried with the same parameters.
    Transient,
    /// Anything else. Logged for operators, never retried.
    Internal,
}

/// Errors returned by the stores, the transaction coordinator and the
/// transfer engine.
#[derive(Error, Debug)]
pub enum BankError {
    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Request rejected before touching the store
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Source balance would go negative while overdrafts are rejected
    #[error("Insufficient funds in account {account_id}: balance would be {balance}")]
    InsufficientFunds { account_id: i64, balance: i64 },

    /// Serialization failure, deadlock or lock timeout reported by the store
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// The unit of work did not finish before its deadline
    #[error("Transaction timed out after {0:?}")]
    Timeout(Duration),

    /// Any other storage failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BankError {
    /// Shorthand for a missing account.
    pub fn account_not_found(id: i64) -> Self {
        BankError::NotFound { entity: "account", id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BankError::NotFound { .. } => ErrorKind::NotFound,
            BankError::InvalidArgument(_) | BankError::InsufficientFunds { .. } => {
                ErrorKind::InvalidArgument
            }
            BankError::Conflict(_) | BankError::Timeout(_) => ErrorKind::Transient,
            BankError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller may retry the whole operation.
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl From<tokio_postgres::Error> for BankError {
    fn from(err: tokio_postgres::Error) -> Self {
        match err.code() {
            Some(code)
                if code == &SqlState::T_R_SERIALIZATION_FAILURE
                    || code == &SqlState::T_R_DEADLOCK_DETECTED
                    || code == &SqlState::LOCK_NOT_AVAILABLE =>
            {
                BankError::Conflict(err.to_string())
            }
            Some(code) if code == &SqlState::NUMERIC_VALUE_OUT_OF_RANGE => {
                // `balance + amount` left the BIGINT range.
                BankError::InvalidArgument(format!("amount out of range: {}", err))
            }
            Some(code) if code == &SqlState::FOREIGN_KEY_VIOLATION => {
                // The only foreign keys in the schema point at accounts.
                let detail = err
                    .as_db_error()
                    .and_then(|db_err| db_err.detail())
                    .unwrap_or("unknown account");
                BankError::Internal(format!("foreign key violation: {}", detail))
                    .into_missing_account(detail)
            }
            _ => BankError::Internal(err.to_string()),
        }
    }
}

impl From<PoolError> for BankError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Timeout(_) => BankError::Conflict(format!("connection pool: {}", err)),
            PoolError::Backend(e) => e.into(),
            other => BankError::Internal(format!("connection pool: {}", other)),
        }
    }
}

impl BankError {
    /// Turn a foreign key violation into `NotFound` when the detail names
    /// the offending id, e.g. `Key (account_id)=(42) is not present ...`.
    fn into_missing_account(self, detail: &str) -> Self {
        detail
            .split_once(")=(")
            .and_then(|(_, rest)| rest.split_once(')'))
            .and_then(|(id, _)| id.parse::<i64>().ok())
            .map(BankError::account_not_found)
            .unwrap_or(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(BankError::account_not_found(1).kind(), ErrorKind::NotFound);
        assert_eq!(
            BankError::InvalidArgument("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            BankError::InsufficientFunds { account_id: 1, balance: -5 }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(BankError::Internal("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_only_conflicts_and_timeouts_are_transient() {
        assert!(BankError::Conflict("deadlock".into()).is_transient());
        assert!(BankError::Timeout(Duration::from_millis(10)).is_transient());
        assert!(!BankError::account_not_found(7).is_transient());
        assert!(!BankError::Internal("connection closed".into()).is_transient());
    }

    #[test]
    fn test_foreign_key_detail_parsing() {
        let err = BankError::Internal("fk".into())
            .into_missing_account("Key (account_id)=(42) is not present in table \"accounts\".");
        assert!(matches!(err, BankError::NotFound { entity: "account", id: 42 }));

        let err = BankError::Internal("fk".into()).into_missing_account("garbage");
        assert!(matches!(err, BankError::Internal(_)));
    }
}
