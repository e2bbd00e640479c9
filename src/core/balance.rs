//! Balance arithmetic and validation
//!
//! Pure functions that compute the balance resulting from a charge or a use,
//! or reject the mutation. No I/O and no shared state: the caller passes in
//! the balance it observed inside the account's serialized task.

use crate::types::{AccountId, LedgerError, Mutation, TransactionType};

/// Compute the balance after charging `amount` points
///
/// # Arguments
///
/// * `account` - Account the charge applies to (for error context)
/// * `current` - Balance observed by the serialized task
/// * `amount` - Requested charge
///
/// # Returns
///
/// * `Ok(new_balance)` - `current + amount`
/// * `Err(LedgerError::InvalidAmount)` - If `amount` is negative
/// * `Err(LedgerError::ArithmeticOverflow)` - If the sum does not fit in an i64
pub fn apply_charge(account: AccountId, current: i64, amount: i64) -> Result<i64, LedgerError> {
    if amount < 0 {
        return Err(LedgerError::invalid_amount(amount));
    }

    current
        .checked_add(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("charge", account))
}

/// Compute the balance after using `amount` points
///
/// Checks run in this order: amount sign, then whether anything is usable at
/// all, then whether the balance covers the amount. A zero-amount use on an
/// empty account is still `NoBalance`.
///
/// # Arguments
///
/// * `account` - Account the use applies to (for error context)
/// * `current` - Balance observed by the serialized task
/// * `amount` - Requested use
///
/// # Returns
///
/// * `Ok(new_balance)` - `current - amount`
/// * `Err(LedgerError::InvalidAmount)` - If `amount` is negative
/// * `Err(LedgerError::NoBalance)` - If `current <= 0`
/// * `Err(LedgerError::InsufficientBalance)` - If `current - amount < 0`
pub fn apply_use(account: AccountId, current: i64, amount: i64) -> Result<i64, LedgerError> {
    if amount < 0 {
        return Err(LedgerError::invalid_amount(amount));
    }

    if current <= 0 {
        return Err(LedgerError::no_balance(account));
    }

    match current.checked_sub(amount) {
        Some(remaining) if remaining >= 0 => Ok(remaining),
        _ => Err(LedgerError::insufficient_balance(account, current, amount)),
    }
}

/// Apply a mutation of either kind to `current`
pub fn apply(account: AccountId, current: i64, mutation: &Mutation) -> Result<i64, LedgerError> {
    match mutation.kind {
        TransactionType::Charge => apply_charge(account, current, mutation.amount),
        TransactionType::Use => apply_use(account, current, mutation.amount),
    }
}
