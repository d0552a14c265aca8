//! In-memory ledger store
//!
//! `MemoryLedger` is the reference [`LedgerStore`]: all tables live behind a
//! single mutex that a transaction holds from begin to commit, which gives
//! serializable isolation. Each write pushes an undo entry; if the transaction
//! ends without committing (error, injected fault, or panic) the undo log is
//! replayed in reverse before the lock is released.
//!
//! Rows owned by a user are keyed with the user id first, so per-user reads
//! are `BTreeMap::range` scans rather than walks over the whole table.
//!
//! # Fault Injection
//!
//! Rollback paths can be exercised deliberately:
//! - [`MemoryLedger::fail_writes_after`] fails every write past a budget
//! - [`MemoryLedger::fail_next_commit`] fails the next commit after all
//!   writes have been applied

use crate::core::traits::{LedgerStore, LedgerTx};
use crate::types::{
    BorrowId, BorrowRecord, CartReservation, EngineError, Item, ItemId, NewItem, NewUser,
    Ownership, User, UserId,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

type PairKey = (UserId, ItemId);

/// Borrows sort by borrower, then item, then age
type BorrowKey = (UserId, ItemId, BorrowId);

/// Every pair key belonging to `user`
fn user_pairs(user: UserId) -> RangeInclusive<PairKey> {
    (user, ItemId(0))..=(user, ItemId(u32::MAX))
}

/// Every borrow key of `user`, or of `user` and one item
fn borrow_keys(user: UserId, item: Option<ItemId>) -> RangeInclusive<BorrowKey> {
    let (first, last) = match item {
        Some(item) => (item, item),
        None => (ItemId(0), ItemId(u32::MAX)),
    };
    (user, first, BorrowId(0))..=(user, last, BorrowId(u64::MAX))
}

/// The ledger tables
#[derive(Debug, Clone)]
struct Tables {
    users: BTreeMap<UserId, User>,
    items: BTreeMap<ItemId, Item>,
    ownerships: BTreeMap<PairKey, u32>,
    borrows: BTreeMap<BorrowKey, BorrowRecord>,
    carts: BTreeMap<PairKey, CartReservation>,
    favorites: BTreeSet<PairKey>,
    sequences: Sequences,
}

/// Next identifiers handed out by inserts
#[derive(Debug, Clone, Copy)]
struct Sequences {
    next_user: u32,
    next_item: u32,
    next_borrow: u64,
}

impl Default for Tables {
    fn default() -> Self {
        Tables {
            users: BTreeMap::new(),
            items: BTreeMap::new(),
            ownerships: BTreeMap::new(),
            borrows: BTreeMap::new(),
            carts: BTreeMap::new(),
            favorites: BTreeSet::new(),
            sequences: Sequences {
                next_user: 1,
                next_item: 1,
                next_borrow: 1,
            },
        }
    }
}

/// Previous state of one row, restored on rollback
#[derive(Debug)]
enum Undo {
    User(UserId, Option<User>),
    Item(ItemId, Option<Item>),
    Ownership(PairKey, Option<u32>),
    Borrow(BorrowKey, Option<BorrowRecord>),
    Cart(PairKey, Option<CartReservation>),
    Favorite(PairKey, bool),
    Sequences(Sequences),
}

fn restore<K: Ord, V>(map: &mut BTreeMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

impl Tables {
    fn apply_undo(&mut self, entry: Undo) {
        match entry {
            Undo::User(id, previous) => restore(&mut self.users, id, previous),
            Undo::Item(id, previous) => restore(&mut self.items, id, previous),
            Undo::Ownership(key, previous) => restore(&mut self.ownerships, key, previous),
            Undo::Borrow(key, previous) => restore(&mut self.borrows, key, previous),
            Undo::Cart(key, previous) => restore(&mut self.carts, key, previous),
            Undo::Favorite(key, present) => {
                if present {
                    self.favorites.insert(key);
                } else {
                    self.favorites.remove(&key);
                }
            }
            Undo::Sequences(sequences) => self.sequences = sequences,
        }
    }
}

#[derive(Debug)]
struct FaultPlan {
    /// Writes allowed per transaction; `usize::MAX` disables the fault
    write_budget: AtomicUsize,
    fail_next_commit: AtomicBool,
}

impl FaultPlan {
    fn new() -> Self {
        FaultPlan {
            write_budget: AtomicUsize::new(usize::MAX),
            fail_next_commit: AtomicBool::new(false),
        }
    }
}

/// Users and items as committed, for output and assertions
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSnapshot {
    pub users: Vec<User>,
    pub items: Vec<Item>,
}

/// Number of rows in each table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    pub users: usize,
    pub items: usize,
    pub ownerships: usize,
    pub borrows: usize,
    pub cart_reservations: usize,
    pub favorites: usize,
}

/// In-memory, serializable ledger store
#[derive(Debug)]
pub struct MemoryLedger {
    tables: Mutex<Tables>,
    faults: FaultPlan,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        MemoryLedger {
            tables: Mutex::new(Tables::default()),
            faults: FaultPlan::new(),
        }
    }

    /// Fail every write past the first `writes` of each transaction
    ///
    /// Stays in effect until [`MemoryLedger::clear_faults`].
    pub fn fail_writes_after(&self, writes: usize) {
        self.faults.write_budget.store(writes, Ordering::SeqCst);
    }

    /// Fail the next commit, after the transaction body has succeeded
    pub fn fail_next_commit(&self) {
        self.faults.fail_next_commit.store(true, Ordering::SeqCst);
    }

    pub fn clear_faults(&self) {
        self.faults.write_budget.store(usize::MAX, Ordering::SeqCst);
        self.faults.fail_next_commit.store(false, Ordering::SeqCst);
    }

    /// Committed users and items, ordered by id
    pub fn snapshot(&self) -> LedgerSnapshot {
        let tables = self.tables.lock();
        LedgerSnapshot {
            users: tables.users.values().cloned().collect(),
            items: tables.items.values().cloned().collect(),
        }
    }

    pub fn counts(&self) -> TableCounts {
        let tables = self.tables.lock();
        TableCounts {
            users: tables.users.len(),
            items: tables.items.len(),
            ownerships: tables.ownerships.len(),
            borrows: tables.borrows.len(),
            cart_reservations: tables.carts.len(),
            favorites: tables.favorites.len(),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for MemoryLedger {
    fn transaction<T, F>(&self, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&mut dyn LedgerTx) -> Result<T, EngineError>,
    {
        let mut tables = self.tables.lock();
        let mut tx = MemoryTx {
            tables: &mut tables,
            faults: &self.faults,
            undo: Vec::new(),
            writes: 0,
            committed: false,
        };

        // Dropping `tx` without commit rolls back
        let value = f(&mut tx)?;
        if self.faults.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(EngineError::store_unavailable("injected commit failure"));
        }
        tx.commit();
        Ok(value)
    }
}

/// One open transaction over the locked tables
struct MemoryTx<'a> {
    tables: &'a mut Tables,
    faults: &'a FaultPlan,
    undo: Vec<Undo>,
    writes: usize,
    committed: bool,
}

impl MemoryTx<'_> {
    /// Account for one write, failing it if the fault budget is spent
    fn begin_write(&mut self) -> Result<(), EngineError> {
        self.writes += 1;
        if self.writes > self.faults.write_budget.load(Ordering::SeqCst) {
            return Err(EngineError::store_unavailable(format!(
                "injected failure on write {}",
                self.writes
            )));
        }
        Ok(())
    }

    fn commit(mut self) {
        self.committed = true;
        self.undo.clear();
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some(entry) = self.undo.pop() {
            self.tables.apply_undo(entry);
        }
    }
}

impl LedgerTx for MemoryTx<'_> {
    fn user(&self, id: UserId) -> Result<Option<User>, EngineError> {
        Ok(self.tables.users.get(&id).cloned())
    }

    fn user_by_username(&self, username: &str) -> Result<Option<User>, EngineError> {
        Ok(self
            .tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    fn insert_user(&mut self, id: Option<UserId>, new: NewUser) -> Result<User, EngineError> {
        let id = id.unwrap_or(UserId(self.tables.sequences.next_user));
        if self.tables.users.contains_key(&id) {
            return Err(EngineError::conflict("User", id.to_string()));
        }
        let next_user = id
            .0
            .checked_add(1)
            .ok_or_else(|| EngineError::arithmetic_overflow("user id sequence"))?;

        self.begin_write()?;
        self.undo.push(Undo::Sequences(self.tables.sequences));
        self.undo.push(Undo::User(id, None));

        let user = User {
            id,
            username: new.username,
            display_name: new.display_name,
            credential_hash: new.credential_hash,
            balance: new.balance,
            role: new.role,
        };
        self.tables.sequences.next_user = self.tables.sequences.next_user.max(next_user);
        self.tables.users.insert(id, user.clone());
        Ok(user)
    }

    fn set_balance(&mut self, id: UserId, balance: Decimal) -> Result<(), EngineError> {
        let previous = self
            .tables
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::user_not_found(id))?;

        self.begin_write()?;
        let mut user = previous.clone();
        user.balance = balance;
        self.undo.push(Undo::User(id, Some(previous)));
        self.tables.users.insert(id, user);
        Ok(())
    }

    fn item(&self, id: ItemId) -> Result<Option<Item>, EngineError> {
        Ok(self.tables.items.get(&id).cloned())
    }

    fn items(&self) -> Result<Vec<Item>, EngineError> {
        Ok(self.tables.items.values().cloned().collect())
    }

    fn insert_item(&mut self, id: Option<ItemId>, new: NewItem) -> Result<Item, EngineError> {
        let id = id.unwrap_or(ItemId(self.tables.sequences.next_item));
        if self.tables.items.contains_key(&id) {
            return Err(EngineError::conflict("Item", id.to_string()));
        }
        let next_item = id
            .0
            .checked_add(1)
            .ok_or_else(|| EngineError::arithmetic_overflow("item id sequence"))?;

        self.begin_write()?;
        self.undo.push(Undo::Sequences(self.tables.sequences));
        self.undo.push(Undo::Item(id, None));

        let item = Item::from_new(id, new);
        self.tables.sequences.next_item = self.tables.sequences.next_item.max(next_item);
        self.tables.items.insert(id, item.clone());
        Ok(item)
    }

    fn set_stock(&mut self, id: ItemId, stock: u32) -> Result<(), EngineError> {
        let previous = self
            .tables
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::item_not_found(id))?;

        self.begin_write()?;
        let mut item = previous.clone();
        item.stock = stock;
        self.undo.push(Undo::Item(id, Some(previous)));
        self.tables.items.insert(id, item);
        Ok(())
    }

    fn delete_item(&mut self, id: ItemId) -> Result<bool, EngineError> {
        let Some(previous) = self.tables.items.get(&id).cloned() else {
            return Ok(false);
        };

        self.begin_write()?;
        self.undo.push(Undo::Item(id, Some(previous)));
        self.tables.items.remove(&id);

        let cart_keys: Vec<PairKey> = self
            .tables
            .carts
            .keys()
            .filter(|(_, item)| *item == id)
            .copied()
            .collect();
        for key in cart_keys {
            let row = self.tables.carts.remove(&key);
            self.undo.push(Undo::Cart(key, row));
        }

        let favorite_keys: Vec<PairKey> = self
            .tables
            .favorites
            .iter()
            .filter(|(_, item)| *item == id)
            .copied()
            .collect();
        for key in favorite_keys {
            self.tables.favorites.remove(&key);
            self.undo.push(Undo::Favorite(key, true));
        }

        Ok(true)
    }

    fn add_ownership(
        &mut self,
        user: UserId,
        item: ItemId,
        delta: u32,
    ) -> Result<Ownership, EngineError> {
        let key = (user, item);
        let previous = self.tables.ownerships.get(&key).copied();
        let quantity = previous
            .unwrap_or(0)
            .checked_add(delta)
            .ok_or_else(|| EngineError::arithmetic_overflow("ownership upsert"))?;

        self.begin_write()?;
        self.undo.push(Undo::Ownership(key, previous));
        self.tables.ownerships.insert(key, quantity);
        Ok(Ownership {
            user,
            item,
            quantity,
        })
    }

    fn ownerships(&self, user: UserId) -> Result<Vec<Ownership>, EngineError> {
        Ok(self
            .tables
            .ownerships
            .range(user_pairs(user))
            .map(|(&(user, item), &quantity)| Ownership {
                user,
                item,
                quantity,
            })
            .collect())
    }

    fn insert_borrow(
        &mut self,
        user: UserId,
        item: ItemId,
        borrowed_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> Result<BorrowRecord, EngineError> {
        let id = BorrowId(self.tables.sequences.next_borrow);
        let next_borrow = id
            .0
            .checked_add(1)
            .ok_or_else(|| EngineError::arithmetic_overflow("borrow id sequence"))?;

        self.begin_write()?;
        self.undo.push(Undo::Sequences(self.tables.sequences));
        let key = (user, item, id);
        self.undo.push(Undo::Borrow(key, None));

        let record = BorrowRecord {
            id,
            user,
            item,
            borrowed_at,
            due_at,
            returned_at: None,
        };
        self.tables.sequences.next_borrow = next_borrow;
        self.tables.borrows.insert(key, record.clone());
        Ok(record)
    }

    fn open_borrow(
        &self,
        user: UserId,
        item: ItemId,
    ) -> Result<Option<BorrowRecord>, EngineError> {
        Ok(self
            .tables
            .borrows
            .range(borrow_keys(user, Some(item)))
            .map(|(_, record)| record)
            .find(|record| record.is_open())
            .cloned())
    }

    fn close_borrow(
        &mut self,
        open: &BorrowRecord,
        returned_at: DateTime<Utc>,
    ) -> Result<BorrowRecord, EngineError> {
        let key = (open.user, open.item, open.id);
        let previous = self.tables.borrows.get(&key).cloned().ok_or_else(|| {
            EngineError::store_unavailable(format!("borrow {} vanished", open.id))
        })?;

        self.begin_write()?;
        let mut record = previous.clone();
        record.returned_at = Some(returned_at);
        self.undo.push(Undo::Borrow(key, Some(previous)));
        self.tables.borrows.insert(key, record.clone());
        Ok(record)
    }

    fn open_borrow_count(&self, item: ItemId) -> Result<usize, EngineError> {
        Ok(self
            .tables
            .borrows
            .values()
            .filter(|record| record.item == item && record.is_open())
            .count())
    }

    fn borrows(&self, user: UserId) -> Result<Vec<BorrowRecord>, EngineError> {
        Ok(self
            .tables
            .borrows
            .range(borrow_keys(user, None))
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn upsert_cart(
        &mut self,
        user: UserId,
        item: ItemId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<CartReservation, EngineError> {
        let key = (user, item);
        let previous = self.tables.carts.get(&key).cloned();

        self.begin_write()?;
        self.undo.push(Undo::Cart(key, previous));

        let row = CartReservation {
            user,
            item,
            expires_at,
            removed_at: None,
        };
        self.tables.carts.insert(key, row.clone());
        Ok(row)
    }

    fn cart_reservation(
        &self,
        user: UserId,
        item: ItemId,
    ) -> Result<Option<CartReservation>, EngineError> {
        Ok(self.tables.carts.get(&(user, item)).cloned())
    }

    fn mark_cart_removed(
        &mut self,
        user: UserId,
        item: ItemId,
        removed_at: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        let key = (user, item);
        let Some(previous) = self.tables.carts.get(&key).cloned() else {
            return Ok(false);
        };

        self.begin_write()?;
        let mut row = previous.clone();
        row.removed_at = Some(removed_at);
        self.undo.push(Undo::Cart(key, Some(previous)));
        self.tables.carts.insert(key, row);
        Ok(true)
    }

    fn cart_reservations(&self, user: UserId) -> Result<Vec<CartReservation>, EngineError> {
        Ok(self
            .tables
            .carts
            .range(user_pairs(user))
            .map(|(_, row)| row.clone())
            .collect())
    }

    fn add_favorite(&mut self, user: UserId, item: ItemId) -> Result<bool, EngineError> {
        let key = (user, item);
        if self.tables.favorites.contains(&key) {
            return Ok(false);
        }

        self.begin_write()?;
        self.undo.push(Undo::Favorite(key, false));
        self.tables.favorites.insert(key);
        Ok(true)
    }

    fn remove_favorite(&mut self, user: UserId, item: ItemId) -> Result<bool, EngineError> {
        let key = (user, item);
        if !self.tables.favorites.contains(&key) {
            return Ok(false);
        }

        self.begin_write()?;
        self.undo.push(Undo::Favorite(key, true));
        self.tables.favorites.remove(&key);
        Ok(true)
    }

    fn favorites(&self, user: UserId) -> Result<Vec<ItemId>, EngineError> {
        Ok(self
            .tables
            .favorites
            .range(user_pairs(user))
            .map(|&(_, item)| item)
            .collect())
    }
}
