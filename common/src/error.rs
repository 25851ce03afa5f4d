//! Error taxonomy for the balance ledger core.
//!
//! Every variant except `Store` is deterministic and caller-input-driven:
//! retrying cannot succeed without different input, so none are retried
//! internally. Transient store failures are the store boundary's concern.

use crate::{Amount, GroupId, UserId};
use thiserror::Error;

/// Main error type for ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// An expense's shares do not sum to its total after rounding correction.
    #[error("Share sum {share_sum} does not match expense total {total}")]
    InvariantViolation { total: Amount, share_sum: Amount },

    /// Settlement rejected at the writer boundary; nothing persisted.
    #[error("Invalid settlement: {reason}")]
    InvalidSettlement { reason: String },

    /// Expense draft rejected at the writer boundary; nothing persisted.
    #[error("Invalid expense: {reason}")]
    InvalidExpense { reason: String },

    /// Referenced user is unknown to the identity provider.
    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    /// Referenced group is unknown to the membership provider.
    #[error("Unknown group: {0}")]
    UnknownGroup(GroupId),

    /// A record references a group the stated participant does not belong to.
    #[error("User {user} is not a member of group {group}")]
    MembershipMismatch { user: UserId, group: GroupId },

    /// Store-layer failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Build an `InvalidSettlement` error.
    pub fn invalid_settlement(reason: impl Into<String>) -> Self {
        LedgerError::InvalidSettlement {
            reason: reason.into(),
        }
    }

    /// Build an `InvalidExpense` error.
    pub fn invalid_expense(reason: impl Into<String>) -> Self {
        LedgerError::InvalidExpense {
            reason: reason.into(),
        }
    }

    /// Check if this error is retryable. Validation failures never are.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Store(_))
    }

    /// Get a stable error code for logs and API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::InvariantViolation { .. } => "INVARIANT_VIOLATION",
            LedgerError::InvalidSettlement { .. } => "INVALID_SETTLEMENT",
            LedgerError::InvalidExpense { .. } => "INVALID_EXPENSE",
            LedgerError::UnknownUser(_) => "UNKNOWN_USER",
            LedgerError::UnknownGroup(_) => "UNKNOWN_GROUP",
            LedgerError::MembershipMismatch { .. } => "MEMBERSHIP_MISMATCH",
            LedgerError::Store(_) => "STORE_ERROR",
        }
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
