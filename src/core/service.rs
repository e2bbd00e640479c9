//! Ledger service: the public operation surface
//!
//! This module provides the `LedgerService` struct, which composes the
//! balance mutator and a [`LedgerStore`] behind the [`AccountSerializer`].
//!
//! # Architecture
//!
//! ```text
//! LedgerService
//!     ├── Arc<dyn LedgerStore>       (balances + append-only history)
//!     ├── Arc<AccountSerializer>     (one FIFO lane per account)
//!     └── LedgerConfig               (caller timeout, lane eviction)
//! ```
//!
//! Every charge or use runs as one serialized task on its account's lane:
//! read the balance, validate and compute, write the balance, append the
//! history record. Reads (`get_balance`, `get_history`) bypass the lanes and
//! may observe a balance that an in-flight task is about to replace.
//!
//! # Commit Rule
//!
//! The balance write and the history append form one logical step. A rejected
//! mutation writes nothing. If the append fails after the balance write, the
//! account is restored exactly as it was (removed again if it did not exist)
//! before the error is returned.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::balance;
use super::serializer::AccountSerializer;
use super::traits::LedgerStore;
use crate::types::{AccountBalance, AccountId, LedgerError, Mutation, TransactionRecord};

/// Tunables for the ledger service
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    /// How long a caller waits for its mutation before giving up
    ///
    /// Giving up does not cancel the mutation: it stays queued and is still
    /// applied in order. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,

    /// Drop an account's lane after this long without work
    ///
    /// `None` keeps lanes for the life of the service.
    pub idle_eviction: Option<Duration>,
}

/// Point ledger service
///
/// Cheap to clone; clones share the same store and serializer.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    serializer: Arc<AccountSerializer>,
    config: LedgerConfig,
}

impl LedgerService {
    /// Create a service over `store` with default configuration
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    /// Create a service over `store` with the given configuration
    pub fn with_config(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        let serializer = match config.idle_eviction {
            Some(idle) => AccountSerializer::with_idle_eviction(idle),
            None => AccountSerializer::new(),
        };

        Self {
            store,
            serializer: Arc::new(serializer),
            config,
        }
    }

    /// The store this service reads and writes
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// The serializer ordering this service's mutations
    pub fn serializer(&self) -> &AccountSerializer {
        &self.serializer
    }

    /// Current balance of an account
    ///
    /// Snapshot read: not ordered against in-flight mutations. Accounts never
    /// seen before report a zero balance.
    pub async fn get_balance(&self, account: AccountId) -> Result<AccountBalance, LedgerError> {
        self.store.read(account).await
    }

    /// History of an account in the order it was applied
    pub async fn get_history(
        &self,
        account: AccountId,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        self.store.read_history(account).await
    }

    /// Snapshot of every account balance known to the store
    pub async fn balances(&self) -> Result<Vec<AccountBalance>, LedgerError> {
        self.store.accounts().await
    }

    /// Wait for every mutation queued so far to be applied
    ///
    /// Callers that timed out or dropped their futures do not cancel their
    /// mutations; `drain` is how a shutdown waits for them.
    pub async fn drain(&self) {
        self.serializer.drain().await;
    }

    /// Charge `amount` points to an account
    ///
    /// The mutation is queued before this method returns.
    ///
    /// # Returns
    ///
    /// * `Ok(AccountBalance)` - The balance after the charge
    /// * `Err(LedgerError::InvalidAmount)` - If `amount` is negative
    pub fn charge(
        &self,
        account: AccountId,
        amount: i64,
    ) -> impl Future<Output = Result<AccountBalance, LedgerError>> + Send + 'static {
        self.apply(account, Mutation::charge(amount))
    }

    /// Use `amount` points from an account
    ///
    /// The mutation is queued before this method returns.
    ///
    /// # Returns
    ///
    /// * `Ok(AccountBalance)` - The balance after the use
    /// * `Err(LedgerError::InvalidAmount)` - If `amount` is negative
    /// * `Err(LedgerError::NoBalance)` - If the balance is zero
    /// * `Err(LedgerError::InsufficientBalance)` - If the balance does not cover `amount`
    pub fn use_points(
        &self,
        account: AccountId,
        amount: i64,
    ) -> impl Future<Output = Result<AccountBalance, LedgerError>> + Send + 'static {
        self.apply(account, Mutation::use_points(amount))
    }

    /// Queue a mutation of either kind on the account's lane
    ///
    /// With a request timeout configured, the returned future yields
    /// `LedgerError::Timeout` once the limit passes; the mutation itself is
    /// still applied when its turn comes.
    pub fn apply(
        &self,
        account: AccountId,
        mutation: Mutation,
    ) -> impl Future<Output = Result<AccountBalance, LedgerError>> + Send + 'static {
        let store = Arc::clone(&self.store);
        let pending = self
            .serializer
            .submit(account, move || commit(store, account, mutation));
        let request_timeout = self.config.request_timeout;

        async move {
            match request_timeout {
                None => pending.await,
                Some(limit) => tokio::time::timeout(limit, pending)
                    .await
                    .unwrap_or_else(|_| {
                        Err(LedgerError::timeout(account, limit.as_millis() as u64))
                    }),
            }
        }
    }
}

/// Body of one serialized mutation task
async fn commit(
    store: Arc<dyn LedgerStore>,
    account: AccountId,
    mutation: Mutation,
) -> Result<AccountBalance, LedgerError> {
    let previous = store.find(account).await?;
    let current = previous.unwrap_or_else(|| AccountBalance::empty(account));
    let point = balance::apply(account, current.point, &mutation)?;

    let written = store.write(account, point).await?;

    let time_millis = Utc::now().timestamp_millis();
    if let Err(error) = store
        .append_history(account, mutation.amount, mutation.kind, time_millis)
        .await
    {
        tracing::warn!(
            account,
            kind = %mutation.kind,
            amount = mutation.amount,
            %error,
            "History append failed, restoring previous balance"
        );
        if let Err(restore_error) = store.restore(account, previous).await {
            tracing::error!(
                account,
                expected = current.point,
                %restore_error,
                "Failed to restore balance after history append failure"
            );
        }
        return Err(error);
    }

    tracing::debug!(
        account,
        kind = %mutation.kind,
        delta = mutation.signed_delta(),
        point,
        "Committed mutation"
    );

    Ok(written)
}
