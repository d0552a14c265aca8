//! Balance and stock guards shared by every mutating engine operation
//!
//! Each guard runs inside the caller's transaction. Checks return a typed
//! rejection without writing anything; the mutating helpers use checked
//! arithmetic and never store a negative balance or stock.

use crate::core::traits::LedgerTx;
use crate::types::{EngineError, Item, ItemId, User, UserId};
use rust_decimal::Decimal;

/// Read a user row, failing with `UserNotFound` if it does not exist
pub fn load_user(tx: &dyn LedgerTx, id: UserId) -> Result<User, EngineError> {
    tx.user(id)?.ok_or_else(|| EngineError::user_not_found(id))
}

/// Read an item row, failing with `ItemNotFound` if it does not exist
pub fn load_item(tx: &dyn LedgerTx, id: ItemId) -> Result<Item, EngineError> {
    tx.item(id)?.ok_or_else(|| EngineError::item_not_found(id))
}

/// Check that `requested` units of `item` are in stock
///
/// # Errors
///
/// `InsufficientStock` naming the item, its stock, and the request.
pub fn ensure_stock(item: &Item, requested: u64) -> Result<(), EngineError> {
    if u64::from(item.stock) < requested {
        return Err(EngineError::insufficient_stock(
            item.id,
            item.stock,
            requested,
        ));
    }
    Ok(())
}

/// Check that the user's balance covers `required`
///
/// A balance exactly equal to `required` passes.
pub fn ensure_funds(user: &User, required: Decimal) -> Result<(), EngineError> {
    if user.balance < required {
        return Err(EngineError::insufficient_funds(
            user.id,
            user.balance,
            required,
        ));
    }
    Ok(())
}

/// Cost of `quantity` units at `price`
pub fn line_total(price: Decimal, quantity: u32) -> Result<Decimal, EngineError> {
    price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| EngineError::arithmetic_overflow("line total"))
}

/// Add `amount` to a running total
pub fn add_to_total(total: Decimal, amount: Decimal) -> Result<Decimal, EngineError> {
    total
        .checked_add(amount)
        .ok_or_else(|| EngineError::arithmetic_overflow("batch total"))
}

/// Reject a money amount below zero
///
/// `field` names the amount in the error, e.g. `"price"`.
pub fn ensure_non_negative(field: &str, amount: Decimal) -> Result<(), EngineError> {
    if amount < Decimal::ZERO {
        return Err(EngineError::invalid_amount(field, amount));
    }
    Ok(())
}

/// Debit `amount` from the user's balance and return the new balance
///
/// # Errors
///
/// - `InvalidAmount` if `amount` is negative
/// - `InsufficientFunds` if the debit would make the balance negative
/// - `ArithmeticOverflow` if the subtraction overflows
pub fn debit(tx: &mut dyn LedgerTx, user: &User, amount: Decimal) -> Result<Decimal, EngineError> {
    ensure_non_negative("debit amount", amount)?;
    let balance = user
        .balance
        .checked_sub(amount)
        .ok_or_else(|| EngineError::arithmetic_overflow("debit"))?;
    if balance < Decimal::ZERO {
        return Err(EngineError::insufficient_funds(
            user.id,
            user.balance,
            amount,
        ));
    }

    tx.set_balance(user.id, balance)?;
    Ok(balance)
}

/// Remove `quantity` units from stock and return the remaining stock
pub fn take_stock(tx: &mut dyn LedgerTx, item: &Item, quantity: u32) -> Result<u32, EngineError> {
    let stock = item
        .stock
        .checked_sub(quantity)
        .ok_or_else(|| EngineError::insufficient_stock(item.id, item.stock, quantity.into()))?;

    tx.set_stock(item.id, stock)?;
    Ok(stock)
}

/// Put `quantity` units back into stock and return the new stock
pub fn restock(tx: &mut dyn LedgerTx, item: &Item, quantity: u32) -> Result<u32, EngineError> {
    let stock = item
        .stock
        .checked_add(quantity)
        .ok_or_else(|| EngineError::arithmetic_overflow("restock"))?;

    tx.set_stock(item.id, stock)?;
    Ok(stock)
}
