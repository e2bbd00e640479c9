//! CSV format handling for point requests and ledger output
//!
//! This module is the request boundary's parsing layer, providing:
//! - CsvRequest structure for deserialization
//! - Validation and conversion from CSV rows to domain requests
//! - Balance and history output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{AccountBalance, AccountId, LedgerError, Mutation, PointRequest, TransactionRecord};
use serde::Deserialize;
use std::io::Write;

/// CSV row structure for deserialization
///
/// Matches the input CSV format with columns: type, account, amount.
/// Fields are kept as raw strings so that malformed values surface as
/// ledger errors rather than opaque deserialization failures.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRequest {
    #[serde(rename = "type")]
    pub request_type: String,
    pub account: String,
    pub amount: Option<String>,
}

/// Parse a raw account identifier
///
/// Accepts positive integers only.
///
/// # Returns
///
/// * `Ok(AccountId)` - The parsed identifier
/// * `Err(LedgerError::InvalidAccountId)` - If the value is not a positive integer
pub fn parse_account_id(raw: &str) -> Result<AccountId, LedgerError> {
    match raw.trim().parse::<AccountId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(LedgerError::invalid_account_id(raw)),
    }
}

/// Parse a raw amount
///
/// Any integer is accepted here, including negative ones: the sign is a
/// business rule enforced by the ledger service.
///
/// # Returns
///
/// * `Ok(i64)` - The parsed amount
/// * `Err(LedgerError::InvalidAmount)` - If the value is missing or not an integer
pub fn parse_amount(raw: Option<&str>) -> Result<i64, LedgerError> {
    let raw = raw.map(str::trim).unwrap_or_default();

    raw.parse::<i64>()
        .map_err(|_| LedgerError::invalid_amount(raw))
}

/// Convert a CsvRequest to a PointRequest
///
/// Validates, in order, the account identifier, the request type and the
/// amount.
///
/// # Arguments
///
/// * `csv_request` - The deserialized CSV row
///
/// # Returns
///
/// Result containing either:
/// - Ok(PointRequest) - Successfully converted request
/// - Err(LedgerError) - The boundary error describing the rejected field
pub fn convert_csv_request(csv_request: CsvRequest) -> Result<PointRequest, LedgerError> {
    let account = parse_account_id(&csv_request.account)?;

    let request_type = csv_request.request_type.trim().to_lowercase();
    let amount = match request_type.as_str() {
        "charge" | "use" => parse_amount(csv_request.amount.as_deref())?,
        _ => return Err(LedgerError::invalid_request_type(&csv_request.request_type)),
    };

    let mutation = if request_type == "charge" {
        Mutation::charge(amount)
    } else {
        Mutation::use_points(amount)
    };

    Ok(PointRequest { account, mutation })
}

/// Write account balances to CSV format
///
/// Writes balances with columns: account, point.
/// Balances are sorted by account ID for deterministic output.
///
/// # Arguments
///
/// * `balances` - Slice of balances to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_balances_csv(
    balances: &[AccountBalance],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "point"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_balances = balances.to_vec();
    sorted_balances.sort_by_key(|balance| balance.id);

    for balance in sorted_balances {
        writer
            .write_record(&[balance.id.to_string(), balance.point.to_string()])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

/// Write transaction history to CSV format
///
/// Writes records with columns: id, account, type, amount, time_millis.
/// Records are grouped by account and kept in record-id order within each
/// account.
pub fn write_history_csv(
    records: &[TransactionRecord],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["id", "account", "type", "amount", "time_millis"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_records = records.to_vec();
    sorted_records.sort_by_key(|record| (record.user_id, record.id));

    for record in sorted_records {
        writer
            .write_record(&[
                record.id.to_string(),
                record.user_id.to_string(),
                record.kind.to_string(),
                record.amount.to_string(),
                record.time_millis.to_string(),
            ])
            .map_err(|e| format!("Failed to write history record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
