//! I/O module
//!
//! The request boundary: CSV parsing, validation and ledger output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row validation, output serialization)
//! - `sync_reader` - Synchronous CSV reader with iterator interface
//! - `async_reader` - Asynchronous CSV reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_csv_request, parse_account_id, parse_amount, write_balances_csv, write_history_csv,
    CsvRequest,
};
pub use sync_reader::SyncReader;
