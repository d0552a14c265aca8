//! Error types for the inventory engine
//!
//! This module defines every error an engine operation or the replay driver
//! can return. Engine errors are typed so callers can map them onto
//! user-visible statuses; none of them is retried inside the engine.
//!
//! # Error Categories
//!
//! - **Not found**: missing user, item, or open borrow
//! - **Business rejections**: insufficient stock or funds, duplicates, permissions
//! - **Input errors**: empty batches, zero quantities, bad loan periods,
//!   negative amounts
//! - **Store errors**: the ledger store could not begin, write, or commit
//! - **File I/O and CSV errors**: only raised by the replay driver

use super::item::ItemId;
use super::user::UserId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the inventory engine
///
/// Every variant carries enough context to explain the rejection. Any error
/// returned from inside a store transaction causes that transaction to roll
/// back before the error reaches the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("User {user} not found")]
    UserNotFound { user: UserId },

    #[error("Item {item} not found")]
    ItemNotFound { item: ItemId },

    /// Return requested for an item the user is not currently borrowing
    #[error("User {user} has no open borrow of item {item}")]
    OpenBorrowNotFound { user: UserId, item: ItemId },

    /// Requested quantity exceeds the item's stock
    #[error("Insufficient stock for item {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: ItemId,
        available: u32,
        requested: u64,
    },

    /// Balance is below the amount the operation would debit
    #[error("Insufficient funds for user {user}: balance {balance}, required {required}")]
    InsufficientFunds {
        user: UserId,
        balance: Decimal,
        required: Decimal,
    },

    /// Catalog entry with the same identity already exists
    #[error("{entity} '{key}' already exists")]
    ConflictAlreadyExists { entity: String, key: String },

    /// The user already holds an open borrow of this item
    #[error("User {user} already has an open borrow of item {item}")]
    BorrowAlreadyOpen { user: UserId, item: ItemId },

    /// Item cannot be deleted while units are out on loan
    #[error("Item {item} still has {open_borrows} open borrow(s)")]
    ItemInUse { item: ItemId, open_borrows: usize },

    #[error("User {user} is not allowed to {action}")]
    Forbidden { user: UserId, action: String },

    #[error("Batch purchase for user {user} contains no lines")]
    EmptyBatch { user: UserId },

    #[error("Invalid quantity {quantity} for item {item}")]
    InvalidQuantity { item: ItemId, quantity: u32 },

    #[error("Invalid loan period of {days} day(s), allowed 1..={max_days}")]
    InvalidLoanPeriod { days: u32, max_days: u32 },

    /// Balance, price, or debit amount below zero
    #[error("Invalid {field}: {amount} is negative")]
    InvalidAmount { field: String, amount: Decimal },

    /// Checked arithmetic failed while computing a balance, stock, or total
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: String },

    /// The ledger store failed to begin, write, or commit
    ///
    /// Fatal for the current request; the transaction has been rolled back.
    #[error("Ledger store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },
}

impl From<std::io::Error> for EngineError {
    fn from(error: std::io::Error) -> Self {
        EngineError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for EngineError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        EngineError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl EngineError {
    pub fn user_not_found(user: UserId) -> Self {
        EngineError::UserNotFound { user }
    }

    pub fn item_not_found(item: ItemId) -> Self {
        EngineError::ItemNotFound { item }
    }

    pub fn open_borrow_not_found(user: UserId, item: ItemId) -> Self {
        EngineError::OpenBorrowNotFound { user, item }
    }

    pub fn insufficient_stock(item: ItemId, available: u32, requested: u64) -> Self {
        EngineError::InsufficientStock {
            item,
            available,
            requested,
        }
    }

    pub fn insufficient_funds(user: UserId, balance: Decimal, required: Decimal) -> Self {
        EngineError::InsufficientFunds {
            user,
            balance,
            required,
        }
    }

    pub fn conflict(entity: &str, key: impl Into<String>) -> Self {
        EngineError::ConflictAlreadyExists {
            entity: entity.to_string(),
            key: key.into(),
        }
    }

    pub fn forbidden(user: UserId, action: &str) -> Self {
        EngineError::Forbidden {
            user,
            action: action.to_string(),
        }
    }

    pub fn invalid_amount(field: &str, amount: Decimal) -> Self {
        EngineError::InvalidAmount {
            field: field.to_string(),
            amount,
        }
    }

    pub fn arithmetic_overflow(operation: &str) -> Self {
        EngineError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        EngineError::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Whether this is one of the not-found family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::UserNotFound { .. }
                | EngineError::ItemNotFound { .. }
                | EngineError::OpenBorrowNotFound { .. }
        )
    }

    /// Short stable label, used for logging and outcome tallies
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::UserNotFound { .. }
            | EngineError::ItemNotFound { .. }
            | EngineError::OpenBorrowNotFound { .. } => "not_found",
            EngineError::InsufficientStock { .. } => "insufficient_stock",
            EngineError::InsufficientFunds { .. } => "insufficient_funds",
            EngineError::ConflictAlreadyExists { .. } | EngineError::BorrowAlreadyOpen { .. } => {
                "conflict"
            }
            EngineError::ItemInUse { .. } => "item_in_use",
            EngineError::Forbidden { .. } => "forbidden",
            EngineError::EmptyBatch { .. }
            | EngineError::InvalidQuantity { .. }
            | EngineError::InvalidLoanPeriod { .. }
            | EngineError::InvalidAmount { .. } => "invalid_input",
            EngineError::ArithmeticOverflow { .. } => "arithmetic_overflow",
            EngineError::StoreUnavailable { .. } => "store_unavailable",
            EngineError::FileNotFound { .. }
            | EngineError::IoError { .. }
            | EngineError::ParseError { .. } => "io",
        }
    }
}
