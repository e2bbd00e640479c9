//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account balance types
//! - `transaction`: Mutations, history records and inbound requests
//! - `error`: Error types for the point ledger

pub mod account;
pub mod error;
pub mod transaction;

pub use account::{AccountBalance, AccountId};
pub use error::LedgerError;
pub use transaction::{Mutation, PointRequest, RecordId, TransactionRecord, TransactionType};
