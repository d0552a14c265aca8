//! Cart reservation policy and cart operations
//!
//! A reservation is a time-boxed hold on cart *visibility*, never on stock.
//! Adding an item upserts the (user, item) row with a fresh expiry; removing
//! it soft-deletes the row. Expiry is a read-time predicate: expired rows
//! stay in the store untouched and simply drop out of listings.
//!
//! ```text
//! absent --add--> active --add--> active (expiry refreshed)
//!                   |
//!                   +--time passes--> expired (derived, no write)
//!                   +--remove-------> removed
//! ```

use crate::core::engine::{trace_outcome, InventoryEngine};
use crate::core::guards;
use crate::core::traits::LedgerStore;
use crate::types::{CartEntry, EngineError, ItemId, UserId};
use chrono::{DateTime, Duration, Utc};

/// Lifetime of new and refreshed cart reservations
///
/// Visibility is decided by the stored expiry on each row, so changing the
/// TTL only affects reservations made afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CartPolicy {
    pub ttl: Duration,
}

impl CartPolicy {
    pub fn new(ttl: Duration) -> Self {
        CartPolicy { ttl }
    }

    /// Expiry of a reservation made or refreshed at `now`
    pub fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, EngineError> {
        now.checked_add_signed(self.ttl)
            .ok_or_else(|| EngineError::arithmetic_overflow("cart expiry"))
    }
}

impl<S: LedgerStore> InventoryEngine<S> {
    pub fn cart_policy(&self) -> CartPolicy {
        CartPolicy::new(self.config().cart_ttl)
    }

    /// Reserve an item in the user's cart
    ///
    /// Re-adding an item refreshes the expiry and clears any earlier removal;
    /// there is never more than one row per (user, item). Stock and balance
    /// are not touched.
    ///
    /// # Returns
    ///
    /// The expiry of the reservation
    ///
    /// # Errors
    ///
    /// Returns an error if the user or item does not exist.
    pub fn add_to_cart(&self, user: UserId, item: ItemId) -> Result<DateTime<Utc>, EngineError> {
        let result = self.cart_policy().expiry_from(self.now()).and_then(|expires_at| {
            self.store().transaction(|tx| {
                guards::load_user(tx, user)?;
                guards::load_item(tx, item)?;
                tx.upsert_cart(user, item, Some(expires_at))?;
                Ok(expires_at)
            })
        });

        trace_outcome("add_to_cart", user, &result);
        result
    }

    /// Soft-delete the reservation of an item
    ///
    /// Idempotent: removing an item that is not in the cart succeeds.
    pub fn remove_from_cart(&self, user: UserId, item: ItemId) -> Result<(), EngineError> {
        let now = self.now();
        let result = self.store().transaction(|tx| {
            guards::load_user(tx, user)?;
            let active = tx
                .cart_reservation(user, item)?
                .is_some_and(|row| row.removed_at.is_none());
            if active {
                tx.mark_cart_removed(user, item, now)?;
            }
            Ok(())
        });

        trace_outcome("remove_from_cart", user, &result);
        result
    }

    /// Items in the user's cart with their reservation expiry, ordered by item id
    ///
    /// Removed and expired reservations are filtered out here; nothing is
    /// written.
    pub fn list_cart(&self, user: UserId) -> Result<Vec<CartEntry>, EngineError> {
        let now = self.now();
        self.store().transaction(|tx| {
            guards::load_user(tx, user)?;
            let mut entries = Vec::new();
            for row in tx.cart_reservations(user)? {
                if !row.is_active(now) {
                    continue;
                }
                if let Some(item) = tx.item(row.item)? {
                    entries.push(CartEntry {
                        item,
                        expires_at: row.expires_at,
                    });
                }
            }
            Ok(entries)
        })
    }
}
