//! Core business logic module
//!
//! This module contains the point ledger components:
//! - `traits` - Storage abstraction behind the service
//! - `store` - Thread-safe in-memory ledger store
//! - `balance` - Pure balance arithmetic and validation
//! - `serializer` - Per-account FIFO execution of mutations
//! - `service` - Public charge/use/balance/history operations

pub mod balance;
pub mod serializer;
pub mod service;
pub mod store;
pub mod traits;

pub use serializer::AccountSerializer;
pub use service::{LedgerConfig, LedgerService};
pub use store::InMemoryLedgerStore;
pub use traits::LedgerStore;
