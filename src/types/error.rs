//! Error types for the point ledger
//!
//! This module defines all error types that can occur while accepting,
//! serializing and applying point mutations.
//!
//! # Error Categories
//!
//! - **Boundary Errors**: Malformed account IDs, amounts and request types
//! - **Domain Rejections**: Invalid amount, no balance, insufficient balance
//! - **Store Errors**: The ledger store could not be read or written
//! - **Serializer Errors**: A queued task aborted, or the caller stopped waiting

use crate::types::AccountId;
use thiserror::Error;

/// Main error type for the point ledger
///
/// Each variant carries enough context for the request boundary to map it
/// to a distinct outward-facing response (see [`LedgerError::code`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Account identifier is not a positive integer
    ///
    /// Caught at the request boundary, before the service is called.
    #[error("Invalid account id '{raw}'")]
    InvalidAccountId {
        /// The raw identifier as received
        raw: String,
    },

    /// Amount is negative or not a number
    #[error("Invalid amount '{amount}'")]
    InvalidAmount {
        /// The rejected amount, as received
        amount: String,
    },

    /// Use attempted on an account with nothing usable
    #[error("Account {account} has no usable balance")]
    NoBalance {
        /// Account ID
        account: AccountId,
    },

    /// Use amount exceeds the current balance
    #[error("Insufficient balance for account {account}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        /// Account ID
        account: AccountId,
        /// Balance observed by the serialized task
        balance: i64,
        /// Requested use amount
        requested: i64,
    },

    /// The ledger store failed a read or write
    #[error("Ledger store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the store failure
        message: String,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account ID
        account: AccountId,
    },

    /// A queued task never delivered its result
    ///
    /// Raised when the operation panicked inside the account's worker. The
    /// account's queue keeps processing later tasks.
    #[error("Task for account {account} aborted before completing")]
    TaskAborted {
        /// Account ID
        account: AccountId,
    },

    /// The caller stopped waiting for its task
    ///
    /// The task itself stays queued and still executes.
    #[error("Timed out after {waited_ms}ms waiting on account {account}")]
    Timeout {
        /// Account ID
        account: AccountId,
        /// How long the caller waited
        waited_ms: u64,
    },

    /// Request type is neither charge nor use
    #[error("Invalid request type '{request_type}'")]
    InvalidRequestType {
        /// The invalid request type string
        request_type: String,
    },
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAccountId error
    pub fn invalid_account_id(raw: &str) -> Self {
        LedgerError::InvalidAccountId {
            raw: raw.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: impl ToString) -> Self {
        LedgerError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    /// Create a NoBalance error
    pub fn no_balance(account: AccountId) -> Self {
        LedgerError::NoBalance { account }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(account: AccountId, balance: i64, requested: i64) -> Self {
        LedgerError::InsufficientBalance {
            account,
            balance,
            requested,
        }
    }

    /// Create a StoreUnavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        LedgerError::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a TaskAborted error
    pub fn task_aborted(account: AccountId) -> Self {
        LedgerError::TaskAborted { account }
    }

    /// Create a Timeout error
    pub fn timeout(account: AccountId, waited_ms: u64) -> Self {
        LedgerError::Timeout { account, waited_ms }
    }

    /// Create an InvalidRequestType error
    pub fn invalid_request_type(request_type: &str) -> Self {
        LedgerError::InvalidRequestType {
            request_type: request_type.to_string(),
        }
    }

    /// Stable outward-facing code for this error
    ///
    /// The request boundary reports these instead of the display message so
    /// that callers can tell the kinds apart without parsing text.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAccountId { .. } => "INVALID_ACCOUNT_ID",
            LedgerError::InvalidAmount { .. } => "INVALID_AMOUNT",
            LedgerError::NoBalance { .. } => "NO_BALANCE",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            LedgerError::ArithmeticOverflow { .. } => "ARITHMETIC_OVERFLOW",
            LedgerError::TaskAborted { .. } => "TASK_ABORTED",
            LedgerError::Timeout { .. } => "TIMEOUT",
            LedgerError::InvalidRequestType { .. } => "INVALID_REQUEST_TYPE",
        }
    }

    /// Whether this error is a business rejection of a well-formed mutation
    ///
    /// Rejections leave the ledger untouched and are never worth retrying
    /// with the same input.
    pub fn is_domain_rejection(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount { .. }
                | LedgerError::NoBalance { .. }
                | LedgerError::InsufficientBalance { .. }
                | LedgerError::ArithmeticOverflow { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::invalid_account_id(
        LedgerError::InvalidAccountId { raw: "abc".to_string() },
        "Invalid account id 'abc'"
    )]
    #[case::invalid_amount(
        LedgerError::InvalidAmount { amount: "-1".to_string() },
        "Invalid amount '-1'"
    )]
    #[case::no_balance(
        LedgerError::NoBalance { account: 7 },
        "Account 7 has no usable balance"
    )]
    #[case::insufficient_balance(
        LedgerError::InsufficientBalance { account: 1, balance: 500, requested: 1000 },
        "Insufficient balance for account 1: balance 500, requested 1000"
    )]
    #[case::store_unavailable(
        LedgerError::StoreUnavailable { message: "disk gone".to_string() },
        "Ledger store unavailable: disk gone"
    )]
    #[case::timeout(
        LedgerError::Timeout { account: 3, waited_ms: 50 },
        "Timed out after 50ms waiting on account 3"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::invalid_account_id(LedgerError::invalid_account_id("x"), "INVALID_ACCOUNT_ID")]
    #[case::invalid_amount(LedgerError::invalid_amount(-1), "INVALID_AMOUNT")]
    #[case::no_balance(LedgerError::no_balance(1), "NO_BALANCE")]
    #[case::insufficient_balance(LedgerError::insufficient_balance(1, 0, 1), "INSUFFICIENT_BALANCE")]
    #[case::store_unavailable(LedgerError::store_unavailable("down"), "STORE_UNAVAILABLE")]
    fn test_domain_kinds_have_distinct_codes(#[case] error: LedgerError, #[case] code: &str) {
        assert_eq!(error.code(), code);
    }

    #[rstest]
    #[case::invalid_amount(LedgerError::invalid_amount(-1), true)]
    #[case::no_balance(LedgerError::no_balance(1), true)]
    #[case::insufficient_balance(LedgerError::insufficient_balance(1, 5, 10), true)]
    #[case::store_unavailable(LedgerError::store_unavailable("down"), false)]
    #[case::task_aborted(LedgerError::task_aborted(1), false)]
    #[case::timeout(LedgerError::timeout(1, 10), false)]
    fn test_is_domain_rejection(#[case] error: LedgerError, #[case] expected: bool) {
        assert_eq!(error.is_domain_rejection(), expected);
    }
}
