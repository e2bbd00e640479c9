//! Core traits for ledger storage
//!
//! This module defines the storage abstraction the ledger service runs
//! against, so the in-memory store can be swapped for a persistent one.

use async_trait::async_trait;

use crate::types::{AccountBalance, AccountId, LedgerError, TransactionRecord, TransactionType};

/// Trait for the balance and history store behind the ledger service
///
/// Implementations must support safe concurrent access across different
/// account keys. Concurrent mutation of the *same* key is never issued by the
/// service: every write for an account comes from that account's serialized
/// task.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Look up the stored balance of an account
    ///
    /// Returns `None` for an account never written.
    async fn find(&self, account: AccountId) -> Result<Option<AccountBalance>, LedgerError>;

    /// Read the current balance of an account
    ///
    /// Returns an empty balance (`point = 0`) for an account never written.
    async fn read(&self, account: AccountId) -> Result<AccountBalance, LedgerError> {
        Ok(self
            .find(account)
            .await?
            .unwrap_or_else(|| AccountBalance::empty(account)))
    }

    /// Overwrite the balance of an account, stamping the update time
    async fn write(&self, account: AccountId, point: i64) -> Result<AccountBalance, LedgerError>;

    /// Put an account back exactly as `previous` found it
    ///
    /// `Some` stores the balance verbatim, `update_millis` included. `None`
    /// removes the account, as if it had never been written.
    async fn restore(
        &self,
        account: AccountId,
        previous: Option<AccountBalance>,
    ) -> Result<(), LedgerError>;

    /// Append an immutable history record and return it with its assigned id
    async fn append_history(
        &self,
        account: AccountId,
        amount: i64,
        kind: TransactionType,
        time_millis: i64,
    ) -> Result<TransactionRecord, LedgerError>;

    /// Read an account's history in append order (ascending record id)
    async fn read_history(&self, account: AccountId)
        -> Result<Vec<TransactionRecord>, LedgerError>;

    /// Snapshot of every balance the store has written
    async fn accounts(&self) -> Result<Vec<AccountBalance>, LedgerError>;
}
