//! Account-related types for the point ledger
//!
//! This module defines the AccountBalance structure, the snapshot of an
//! account's point balance as held by the ledger store.

use serde::{Deserialize, Serialize};

/// Account identifier
///
/// Accounts are identified by positive integers. Zero is rejected at the
/// request boundary.
pub type AccountId = u64;

/// Point balance of a single account
///
/// Represents the current balance of an account together with the time of
/// its last mutation. Serialized as `{id, point, updateMillis}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBalance {
    /// The account this balance belongs to
    pub id: AccountId,

    /// Current balance in the smallest point unit
    ///
    /// Never negative. Every mutation goes through the balance mutator, which
    /// rejects anything that would take it below zero.
    pub point: i64,

    /// Epoch milliseconds of the last applied mutation
    ///
    /// Zero for an account that has never been mutated.
    pub update_millis: i64,
}

impl AccountBalance {
    /// Create an empty balance for an account that has never been seen
    ///
    /// # Arguments
    ///
    /// * `id` - The account ID for this balance
    ///
    /// # Returns
    ///
    /// A new AccountBalance with `point = 0` and `update_millis = 0`
    pub fn empty(id: AccountId) -> Self {
        AccountBalance {
            id,
            point: 0,
            update_millis: 0,
        }
    }
}
