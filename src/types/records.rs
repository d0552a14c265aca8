//! Relationship records between users and items
//!
//! These rows are created and mutated only inside engine transactions:
//! - `Ownership`: accumulated purchases, never decremented or deleted
//! - `BorrowRecord`: one loan, open until `returned_at` is set
//! - `CartReservation`: a time-boxed cart hold that gates cart visibility only

use super::item::{Item, ItemId};
use super::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Borrow record identifier, assigned by the ledger store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BorrowId(pub u64);

impl fmt::Display for BorrowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Units of an item owned by a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    pub user: UserId,
    pub item: ItemId,
    pub quantity: u32,
}

/// A single loan of one unit of an item
#[derive(Debug, Clone, PartialEq)]
pub struct BorrowRecord {
    pub id: BorrowId,
    pub user: UserId,
    pub item: ItemId,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,

    /// Set when the unit is given back; `None` while the loan is open
    pub returned_at: Option<DateTime<Utc>>,
}

impl BorrowRecord {
    /// Whether the loan still holds a unit of stock
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Whether an open loan has passed its due date
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_at < now
    }
}

/// Cart reservation row, unique per (user, item)
///
/// Active while `removed_at` is `None` and `expires_at` is `None` or in the
/// future. Expiry is evaluated at read time; expired rows are never deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct CartReservation {
    pub user: UserId,
    pub item: ItemId,
    pub expires_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl CartReservation {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.removed_at.is_none() && self.expires_at.map_or(true, |expires| expires > now)
    }
}

/// One line of a batch purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseLine {
    pub item: ItemId,
    pub quantity: u32,
}

impl PurchaseLine {
    pub fn new(item: ItemId, quantity: u32) -> Self {
        PurchaseLine { item, quantity }
    }
}

/// Item visible in a user's cart, with its reservation expiry
#[derive(Debug, Clone, PartialEq)]
pub struct CartEntry {
    pub item: Item,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Item currently borrowed by a user
#[derive(Debug, Clone, PartialEq)]
pub struct BorrowedEntry {
    pub item: Item,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// Item in a user's purchase history
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedEntry {
    pub item: Item,
    pub quantity: u32,
}
