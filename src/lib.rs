//! Rust Inventory Engine Library
//! # Overview
//!
//! Transactional inventory and balance engine for a catalog of items that
//! users can buy, borrow for a number of days, or reserve in a cart. Every
//! operation runs inside one ledger store transaction: it either commits all
//! of its balance, stock, ownership, borrow, and cart changes or none of them.
//!
//! # Architecture
//!
//! - [`types`] - Ids, users, items, ledger records, operations, and errors
//! - [`core`] - Business logic components:
//!   - [`core::traits`] - The ledger store seam (`LedgerStore`, `LedgerTx`)
//!   - [`core::ledger_store`] - In-memory store with undo-log rollback
//!   - [`core::engine`] - Purchase, batch purchase, borrow, return, checkout
//!   - [`core::cart`] - Cart reservations with lazy TTL expiry
//!   - [`core::catalog`] - Users, items, and favorites
//! - [`io`] - Seed and operations CSV readers, inventory CSV output
//! - [`strategy`] - Sequential and concurrent replay pipelines
//! - [`cli`] - CLI arguments parsing
//! - [`logging`] - `tracing` subscriber setup
//!
//! # Guarantees
//!
//! - Stock never goes below zero and balances are never debited below zero
//! - Concurrent buyers of the last unit: exactly one succeeds
//! - A failed operation leaves no partial writes behind
//! - Expired cart rows are hidden on read, never deleted

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use core::{Catalog, EngineConfig, InventoryEngine, LedgerStore, LedgerTx, MemoryLedger};
pub use io::write_inventory_csv;
pub use types::{
    BorrowRecord, CartEntry, EngineError, Item, ItemId, Operation, PurchaseLine, User, UserId,
};
