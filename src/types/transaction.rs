//! Transaction-related types for the point ledger
//!
//! This module defines the history record written for every applied mutation,
//! the mutation itself, and the inbound request as parsed at the boundary.

use super::account::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// History record identifier
///
/// Assigned by the ledger store, strictly increasing in write order.
pub type RecordId = u64;

/// Kinds of balance mutation supported by the ledger
///
/// Serialized as `CHARGE` / `USE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Increase the account balance by the requested amount
    Charge,

    /// Decrease the account balance by the requested amount
    ///
    /// Bounded by the current balance: a use can never take the balance
    /// below zero.
    Use,
}

impl TransactionType {
    /// Wire name of the transaction type, as written to history output
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Charge => "CHARGE",
            TransactionType::Use => "USE",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable history entry describing one applied mutation
///
/// Serialized as `{id, userId, amount, type, timeMillis}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Store-assigned identifier, ordered by write order
    pub id: RecordId,

    /// The account the mutation was applied to
    pub user_id: AccountId,

    /// Magnitude of the change as applied
    ///
    /// Positive for both kinds; the direction is carried by `kind`.
    pub amount: i64,

    /// Whether the record is a charge or a use
    #[serde(rename = "type")]
    pub kind: TransactionType,

    /// Epoch milliseconds at which the mutation was applied
    pub time_millis: i64,
}

/// A requested change to an account balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    /// Charge or use
    pub kind: TransactionType,

    /// Requested magnitude, validated by the balance mutator
    pub amount: i64,
}

impl Mutation {
    /// Create a charge mutation
    pub fn charge(amount: i64) -> Self {
        Mutation {
            kind: TransactionType::Charge,
            amount,
        }
    }

    /// Create a use mutation
    pub fn use_points(amount: i64) -> Self {
        Mutation {
            kind: TransactionType::Use,
            amount,
        }
    }

    /// Signed change this mutation applies to a balance
    ///
    /// Positive for a charge, negative for a use.
    pub fn signed_delta(&self) -> i64 {
        match self.kind {
            TransactionType::Charge => self.amount,
            TransactionType::Use => -self.amount,
        }
    }
}

/// Inbound request as accepted by the request boundary
///
/// The account ID has already been validated as a positive integer and the
/// amount as an integer. The sign of the amount is checked by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointRequest {
    /// Target account
    pub account: AccountId,

    /// Mutation to apply
    pub mutation: Mutation,
}
