//! Thread-safe in-memory ledger store
//!
//! This module provides the `InMemoryLedgerStore` struct, which keeps account
//! balances and transaction history in concurrent maps.
//!
//! # Design
//!
//! Balances and histories live in two separate `DashMap`s keyed by account
//! ID. DashMap shards its locks internally, so readers and writers on
//! different accounts never contend on a single global lock. Record IDs are
//! drawn from one atomic counter, which makes them unique across the store
//! and ordered by write order.
//!
//! # Simulated Latency
//!
//! The store can be configured to sleep before every call. This widens the
//! window between a task's read and its write, which is what makes lost
//! updates observable when mutations are *not* serialized. Tests and the CLI
//! use it to exercise the serializer under realistic interleavings.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::traits::LedgerStore;
use crate::types::{
    AccountBalance, AccountId, LedgerError, RecordId, TransactionRecord, TransactionType,
};

/// In-memory implementation of [`LedgerStore`]
#[derive(Debug)]
pub struct InMemoryLedgerStore {
    /// Current balance per account
    balances: DashMap<AccountId, AccountBalance>,

    /// Append-only history per account, in record-id order
    histories: DashMap<AccountId, Vec<TransactionRecord>>,

    /// Next record ID to hand out
    cursor: AtomicU64,

    /// Delay applied before every store call
    latency: Option<Duration>,
}

impl InMemoryLedgerStore {
    /// Create a new empty store with no simulated latency
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            histories: DashMap::new(),
            cursor: AtomicU64::new(1),
            latency: None,
        }
    }

    /// Create a new empty store that sleeps for `latency` before every call
    ///
    /// A zero duration is treated as no latency.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: (!latency.is_zero()).then_some(latency),
            ..Self::new()
        }
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn next_record_id(&self) -> RecordId {
        self.cursor.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn find(&self, account: AccountId) -> Result<Option<AccountBalance>, LedgerError> {
        self.simulate_latency().await;

        Ok(self.balances.get(&account).map(|entry| *entry.value()))
    }

    async fn write(&self, account: AccountId, point: i64) -> Result<AccountBalance, LedgerError> {
        self.simulate_latency().await;

        let balance = AccountBalance {
            id: account,
            point,
            update_millis: Utc::now().timestamp_millis(),
        };
        self.balances.insert(account, balance);

        Ok(balance)
    }

    async fn restore(
        &self,
        account: AccountId,
        previous: Option<AccountBalance>,
    ) -> Result<(), LedgerError> {
        self.simulate_latency().await;

        match previous {
            Some(balance) => {
                self.balances.insert(account, balance);
            }
            None => {
                self.balances.remove(&account);
            }
        }

        Ok(())
    }

    async fn append_history(
        &self,
        account: AccountId,
        amount: i64,
        kind: TransactionType,
        time_millis: i64,
    ) -> Result<TransactionRecord, LedgerError> {
        self.simulate_latency().await;

        // The id is drawn while holding the account's entry so that ids
        // within one history are strictly increasing in append order.
        let mut history = self.histories.entry(account).or_default();
        let record = TransactionRecord {
            id: self.next_record_id(),
            user_id: account,
            amount,
            kind,
            time_millis,
        };
        history.push(record.clone());

        Ok(record)
    }

    async fn read_history(
        &self,
        account: AccountId,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        self.simulate_latency().await;

        Ok(self
            .histories
            .get(&account)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn accounts(&self) -> Result<Vec<AccountBalance>, LedgerError> {
        Ok(self
            .balances
            .iter()
            .map(|entry| *entry.value())
            .collect())
    }
}
