//! Inventory and balance engine
//!
//! This module provides the InventoryEngine that executes every stock and
//! balance mutation as exactly one ledger store transaction.
//!
//! The engine enforces business rules such as:
//! - Existence checks first, then stock, then funds
//! - `balance >= cost` as the funds gate for purchases, batches, and borrows
//! - At most one open borrow per (user, item)
//! - All-or-nothing application of batch purchases
//!
//! The engine keeps no mutable state between calls. Every operation re-reads
//! balances and stock from the store at the start of its transaction, so one
//! engine can be cloned across threads freely.

use crate::core::clock::{system_clock, SharedClock};
use crate::core::config::EngineConfig;
use crate::core::guards;
use crate::core::traits::{LedgerStore, LedgerTx};
use crate::types::{
    BorrowRecord, BorrowedEntry, EngineError, ItemId, Operation, OwnedEntry, PurchaseLine,
    UserId,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Inventory and balance transaction engine
///
/// Generic over the ledger store so the same rules run against the in-memory
/// ledger or any other transactional backend.
pub struct InventoryEngine<S> {
    store: Arc<S>,
    clock: SharedClock,
    config: EngineConfig,
}

impl<S> Clone for InventoryEngine<S> {
    fn clone(&self) -> Self {
        InventoryEngine {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<S: LedgerStore> InventoryEngine<S> {
    /// Create a new InventoryEngine
    ///
    /// # Arguments
    ///
    /// * `store` - The ledger store all operations run against
    /// * `clock` - Source of the current time (UTC)
    /// * `config` - Cart TTL and loan bounds
    pub fn new(store: Arc<S>, clock: SharedClock, config: EngineConfig) -> Self {
        InventoryEngine {
            store,
            clock,
            config,
        }
    }

    /// Engine on the wall clock with the default configuration
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, system_clock(), EngineConfig::default())
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Apply one operation, discarding its success payload
    ///
    /// Routes the operation to the matching engine call.
    ///
    /// # Arguments
    ///
    /// * `operation` - The operation to apply
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the operation committed
    /// * `Err(EngineError)` if it was rejected or the store failed
    pub fn apply(&self, operation: &Operation) -> Result<(), EngineError> {
        match operation {
            Operation::Purchase { user, item } => self.purchase(*user, *item).map(|_| ()),
            Operation::BatchPurchase { user, lines } => self.batch_purchase(*user, lines),
            Operation::Borrow { user, item, days } => self.borrow(*user, *item, *days).map(|_| ()),
            Operation::Return { user, item } => self.give_back(*user, *item).map(|_| ()),
            Operation::AddToCart { user, item } => self.add_to_cart(*user, *item).map(|_| ()),
            Operation::RemoveFromCart { user, item } => self.remove_from_cart(*user, *item),
            Operation::Checkout { user } => self.checkout(*user).map(|_| ()),
        }
    }

    /// Buy one unit of an item
    ///
    /// # Arguments
    ///
    /// * `user` - The buyer
    /// * `item` - The item to buy
    ///
    /// # Returns
    ///
    /// The user's ownership quantity of the item after the purchase
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The user or item does not exist
    /// - The item is out of stock
    /// - The balance is below the item's price
    /// - The store fails; nothing is written in that case
    pub fn purchase(&self, user: UserId, item: ItemId) -> Result<u32, EngineError> {
        let result = self.store.transaction(|tx| {
            let buyer = guards::load_user(tx, user)?;
            let product = guards::load_item(tx, item)?;
            guards::ensure_stock(&product, 1)?;
            guards::ensure_funds(&buyer, product.price)?;

            guards::debit(tx, &buyer, product.price)?;
            guards::take_stock(tx, &product, 1)?;
            let ownership = tx.add_ownership(user, item, 1)?;
            Ok(ownership.quantity)
        });

        trace_outcome("purchase", user, &result);
        result
    }

    /// Buy several items at once, all or nothing
    ///
    /// Lines naming the same item are merged, so stock is checked against the
    /// combined request. Every line is validated and the total computed before
    /// anything is written; then the balance is debited once and each line's
    /// stock and ownership are updated.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `lines` is empty (`EmptyBatch`) or a line has quantity 0 (`InvalidQuantity`)
    /// - The user or any item does not exist
    /// - Any merged line exceeds its item's stock (`InsufficientStock` naming it)
    /// - The balance is below the total (`InsufficientFunds`)
    pub fn batch_purchase(&self, user: UserId, lines: &[PurchaseLine]) -> Result<(), EngineError> {
        let merged = merge_lines(user, lines);
        let result = merged.and_then(|merged| {
            self.store
                .transaction(|tx| Self::buy_lines(tx, user, &merged).map(|_| ()))
        });

        trace_outcome("batch_purchase", user, &result);
        result
    }

    /// Borrow one unit of an item for `days` days
    ///
    /// # Returns
    ///
    /// The new open borrow record, with `due_at = now + days` on the UTC basis
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `days` is outside `1..=max_loan_days` (`InvalidLoanPeriod`)
    /// - The user or item does not exist
    /// - The user already has an open borrow of the item (`BorrowAlreadyOpen`)
    /// - The item is out of stock
    /// - The balance is below the borrow price
    pub fn borrow(&self, user: UserId, item: ItemId, days: u32) -> Result<BorrowRecord, EngineError> {
        let result = self.loan_period(days).and_then(|period| {
            let now = self.now();
            let due_at = now
                .checked_add_signed(period)
                .ok_or_else(|| EngineError::arithmetic_overflow("due date"))?;

            self.store.transaction(|tx| {
                let borrower = guards::load_user(tx, user)?;
                let product = guards::load_item(tx, item)?;
                if tx.open_borrow(user, item)?.is_some() {
                    return Err(EngineError::BorrowAlreadyOpen { user, item });
                }
                guards::ensure_stock(&product, 1)?;
                guards::ensure_funds(&borrower, product.borrow_price)?;

                guards::debit(tx, &borrower, product.borrow_price)?;
                guards::take_stock(tx, &product, 1)?;
                tx.insert_borrow(user, item, now, due_at)
            })
        });

        trace_outcome("borrow", user, &result);
        result
    }

    /// Give back a borrowed unit
    ///
    /// Closes the open borrow and returns the unit to stock. The borrow price
    /// is not refunded.
    ///
    /// # Errors
    ///
    /// `OpenBorrowNotFound` if the user has no open borrow of the item, which
    /// includes a second return of the same loan.
    pub fn give_back(&self, user: UserId, item: ItemId) -> Result<BorrowRecord, EngineError> {
        let now = self.now();
        let result = self.store.transaction(|tx| {
            guards::load_user(tx, user)?;
            let product = guards::load_item(tx, item)?;
            let open = tx
                .open_borrow(user, item)?
                .ok_or_else(|| EngineError::open_borrow_not_found(user, item))?;

            let closed = tx.close_borrow(&open, now)?;
            guards::restock(tx, &product, 1)?;
            Ok(closed)
        });

        trace_outcome("give_back", user, &result);
        result
    }

    /// Items the user currently has on loan, with their due dates
    pub fn list_borrowed(&self, user: UserId) -> Result<Vec<BorrowedEntry>, EngineError> {
        self.store.transaction(|tx| {
            guards::load_user(tx, user)?;
            let mut entries = Vec::new();
            for record in tx.borrows(user)? {
                if !record.is_open() {
                    continue;
                }
                entries.push(BorrowedEntry {
                    item: guards::load_item(tx, record.item)?,
                    borrowed_at: record.borrowed_at,
                    due_at: record.due_at,
                });
            }
            Ok(entries)
        })
    }

    /// Purchase history: every item the user owns with its quantity
    ///
    /// Items deleted from the catalog since the purchase are left out.
    pub fn list_owned(&self, user: UserId) -> Result<Vec<OwnedEntry>, EngineError> {
        self.store.transaction(|tx| {
            guards::load_user(tx, user)?;
            let mut entries = Vec::new();
            for ownership in tx.ownerships(user)? {
                if let Some(item) = tx.item(ownership.item)? {
                    entries.push(OwnedEntry {
                        item,
                        quantity: ownership.quantity,
                    });
                }
            }
            Ok(entries)
        })
    }

    /// Buy every item in the user's active cart and clear those reservations
    ///
    /// Runs as one batch purchase of quantity 1 per item; the cart rows are
    /// soft-removed in the same transaction, so a rejected checkout leaves the
    /// cart as it was.
    ///
    /// # Returns
    ///
    /// The purchased lines, ordered by item id
    ///
    /// # Errors
    ///
    /// `EmptyBatch` if no reservation is active, otherwise as for
    /// [`InventoryEngine::batch_purchase`].
    pub fn checkout(&self, user: UserId) -> Result<Vec<PurchaseLine>, EngineError> {
        let now = self.now();
        let result = self.store.transaction(|tx| {
            guards::load_user(tx, user)?;
            let reserved: Vec<(ItemId, u64)> = tx
                .cart_reservations(user)?
                .into_iter()
                .filter(|row| row.is_active(now))
                .map(|row| (row.item, 1))
                .collect();
            if reserved.is_empty() {
                return Err(EngineError::EmptyBatch { user });
            }

            let lines = Self::buy_lines(tx, user, &reserved)?;
            for line in &lines {
                tx.mark_cart_removed(user, line.item, now)?;
            }
            Ok(lines)
        });

        trace_outcome("checkout", user, &result);
        result
    }

    /// Current balance of a user
    pub fn balance(&self, user: UserId) -> Result<Decimal, EngineError> {
        self.store
            .transaction(|tx| Ok(guards::load_user(tx, user)?.balance))
    }

    /// Validate and apply merged purchase lines inside an open transaction
    fn buy_lines(
        tx: &mut dyn LedgerTx,
        user: UserId,
        lines: &[(ItemId, u64)],
    ) -> Result<Vec<PurchaseLine>, EngineError> {
        let buyer = guards::load_user(tx, user)?;

        let mut validated = Vec::with_capacity(lines.len());
        let mut total = Decimal::ZERO;
        for &(item, requested) in lines {
            let product = guards::load_item(tx, item)?;
            guards::ensure_stock(&product, requested)?;

            // Bounded by stock, which is a u32
            let quantity = u32::try_from(requested)
                .map_err(|_| EngineError::arithmetic_overflow("line quantity"))?;
            total = guards::add_to_total(total, guards::line_total(product.price, quantity)?)?;
            validated.push((product, quantity));
        }
        guards::ensure_funds(&buyer, total)?;

        guards::debit(tx, &buyer, total)?;
        let mut bought = Vec::with_capacity(validated.len());
        for (product, quantity) in validated {
            guards::take_stock(tx, &product, quantity)?;
            tx.add_ownership(user, product.id, quantity)?;
            bought.push(PurchaseLine::new(product.id, quantity));
        }
        Ok(bought)
    }

    fn loan_period(&self, days: u32) -> Result<Duration, EngineError> {
        let max_days = self.config.max_loan_days;
        if days == 0 || days > max_days {
            return Err(EngineError::InvalidLoanPeriod { days, max_days });
        }
        Ok(Duration::days(i64::from(days)))
    }
}

/// Merge lines by item, rejecting empty batches and zero quantities
fn merge_lines(user: UserId, lines: &[PurchaseLine]) -> Result<Vec<(ItemId, u64)>, EngineError> {
    if lines.is_empty() {
        return Err(EngineError::EmptyBatch { user });
    }

    let mut merged: BTreeMap<ItemId, u64> = BTreeMap::new();
    for line in lines {
        if line.quantity == 0 {
            return Err(EngineError::InvalidQuantity {
                item: line.item,
                quantity: line.quantity,
            });
        }
        *merged.entry(line.item).or_default() += u64::from(line.quantity);
    }
    Ok(merged.into_iter().collect())
}

/// Log the outcome of a mutating operation
///
/// Business rejections are routine and logged at debug; store failures and
/// overflows are logged at warn.
pub(crate) fn trace_outcome<T>(operation: &str, user: UserId, result: &Result<T, EngineError>) {
    match result {
        Ok(_) => debug!(operation, %user, "committed"),
        Err(
            error @ (EngineError::StoreUnavailable { .. } | EngineError::ArithmeticOverflow { .. }),
        ) => warn!(operation, %user, %error, "rolled back"),
        Err(error) => debug!(operation, %user, kind = error.kind(), %error, "rejected"),
    }
}
