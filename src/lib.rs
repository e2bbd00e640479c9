//! Point Ledger Library
//! # Overview
//!
//! A per-account point ledger: accounts are charged and spent in integer
//! points, balances never go negative, and every applied mutation leaves an
//! append-only history record. Mutations for the same account run strictly
//! one at a time in arrival order; different accounts proceed in parallel.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (AccountBalance, TransactionRecord, LedgerError, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::balance`] - Balance arithmetic and validation
//!   - [`core::serializer`] - Per-account FIFO task execution
//!   - [`core::service`] - Charge, use, balance and history operations
//!   - [`core::store`] - In-memory balance and history storage
//! - [`io`] - CSV request parsing and balance/history output
//! - [`strategy`] - Sequential and concurrent replay of request files
//!
//! # Example
//!
//! ```
//! use point_ledger::{InMemoryLedgerStore, LedgerService};
//! use std::sync::Arc;
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! runtime.block_on(async {
//!     let service = LedgerService::new(Arc::new(InMemoryLedgerStore::new()));
//!
//!     service.charge(1, 1000).await.unwrap();
//!     let balance = service.use_points(1, 300).await.unwrap();
//!
//!     assert_eq!(balance.point, 700);
//!     assert_eq!(service.get_history(1).await.unwrap().len(), 2);
//! });
//! ```

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{AccountSerializer, InMemoryLedgerStore, LedgerConfig, LedgerService, LedgerStore};
pub use io::{write_balances_csv, write_history_csv};
pub use types::{
    AccountBalance, AccountId, LedgerError, Mutation, PointRequest, RecordId, TransactionRecord,
    TransactionType,
};
