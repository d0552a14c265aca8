//! Core traits for the ledger store the engine runs its transactions against
//!
//! The engine never touches rows directly: every operation is one call to
//! [`LedgerStore::transaction`], and all reads and writes inside it go through
//! the [`LedgerTx`] handle. Any store that honours the commit-or-rollback
//! contract (an in-memory ledger, a relational database) can back the engine.

use crate::types::{
    BorrowRecord, CartReservation, EngineError, Item, ItemId, NewItem, NewUser, Ownership, User,
    UserId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Row-level access to the ledger tables inside one transaction
///
/// Reads observe the transaction's own writes. Rows read through a handle
/// stay locked against concurrent writers until the transaction ends, so a
/// read followed by a write of the same row is free of lost updates.
pub trait LedgerTx {
    // users

    fn user(&self, id: UserId) -> Result<Option<User>, EngineError>;

    fn user_by_username(&self, username: &str) -> Result<Option<User>, EngineError>;

    /// Insert a user, with the given id or the next free one
    fn insert_user(&mut self, id: Option<UserId>, new: NewUser) -> Result<User, EngineError>;

    fn set_balance(&mut self, id: UserId, balance: Decimal) -> Result<(), EngineError>;

    // items

    fn item(&self, id: ItemId) -> Result<Option<Item>, EngineError>;

    /// All items ordered by id
    fn items(&self) -> Result<Vec<Item>, EngineError>;

    /// Insert an item, with the given id or the next free one
    fn insert_item(&mut self, id: Option<ItemId>, new: NewItem) -> Result<Item, EngineError>;

    fn set_stock(&mut self, id: ItemId, stock: u32) -> Result<(), EngineError>;

    /// Delete an item together with its cart and favorite rows
    ///
    /// Returns `false` if the item did not exist.
    fn delete_item(&mut self, id: ItemId) -> Result<bool, EngineError>;

    // ownerships, unique on (user, item)

    /// Insert with `quantity = delta`, or add `delta` to the existing row
    fn add_ownership(
        &mut self,
        user: UserId,
        item: ItemId,
        delta: u32,
    ) -> Result<Ownership, EngineError>;

    fn ownerships(&self, user: UserId) -> Result<Vec<Ownership>, EngineError>;

    // borrows

    fn insert_borrow(
        &mut self,
        user: UserId,
        item: ItemId,
        borrowed_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> Result<BorrowRecord, EngineError>;

    /// The open borrow of `item` by `user`, oldest first if several exist
    fn open_borrow(&self, user: UserId, item: ItemId)
        -> Result<Option<BorrowRecord>, EngineError>;

    /// Set `returned_at` on an open borrow found by [`LedgerTx::open_borrow`]
    fn close_borrow(
        &mut self,
        open: &BorrowRecord,
        returned_at: DateTime<Utc>,
    ) -> Result<BorrowRecord, EngineError>;

    fn open_borrow_count(&self, item: ItemId) -> Result<usize, EngineError>;

    /// All borrow records of a user, open and closed, by item then oldest first
    fn borrows(&self, user: UserId) -> Result<Vec<BorrowRecord>, EngineError>;

    // cart reservations, unique on (user, item)

    /// Insert or refresh the reservation, clearing any `removed_at`
    fn upsert_cart(
        &mut self,
        user: UserId,
        item: ItemId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<CartReservation, EngineError>;

    fn cart_reservation(
        &self,
        user: UserId,
        item: ItemId,
    ) -> Result<Option<CartReservation>, EngineError>;

    /// Set `removed_at` on the row; returns `false` if there is no row
    fn mark_cart_removed(
        &mut self,
        user: UserId,
        item: ItemId,
        removed_at: DateTime<Utc>,
    ) -> Result<bool, EngineError>;

    /// Every reservation row of a user, whatever its state
    fn cart_reservations(&self, user: UserId) -> Result<Vec<CartReservation>, EngineError>;

    // favorites, unique on (user, item)

    fn add_favorite(&mut self, user: UserId, item: ItemId) -> Result<bool, EngineError>;

    fn remove_favorite(&mut self, user: UserId, item: ItemId) -> Result<bool, EngineError>;

    fn favorites(&self, user: UserId) -> Result<Vec<ItemId>, EngineError>;
}

/// A transactional ledger store
///
/// `transaction` begins a transaction, runs `f` against it, and commits if
/// `f` returns `Ok`. If `f` returns `Err` (or the commit fails) every write
/// made through the handle is rolled back before the error is returned.
/// Begin and commit failures surface as [`EngineError::StoreUnavailable`].
pub trait LedgerStore: Send + Sync {
    fn transaction<T, F>(&self, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, EngineError>;
}
