//! Catalog and favorites accessors
//!
//! Thin wrappers around the ledger store for user registration, catalog
//! administration, and favorites. They never touch balances or stock
//! beyond the initial values of a new row.

use crate::core::guards;
use crate::core::traits::{LedgerStore, LedgerTx};
use crate::types::{EngineError, Item, ItemId, NewItem, NewUser, User, UserId};
use std::sync::Arc;
use tracing::debug;

/// Catalog accessors over a ledger store
pub struct Catalog<S> {
    store: Arc<S>,
}

impl<S> Clone for Catalog<S> {
    fn clone(&self) -> Self {
        Catalog {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> Catalog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Catalog { store }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the opening balance is negative
    /// - `ConflictAlreadyExists` if the username is taken
    pub fn register_user(&self, new: NewUser) -> Result<User, EngineError> {
        self.import_user(None, new)
    }

    /// Insert a user with a fixed id, as when loading an existing ledger
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a negative balance, `ConflictAlreadyExists` if
    /// the id or the username is taken.
    pub fn import_user(&self, id: Option<UserId>, new: NewUser) -> Result<User, EngineError> {
        guards::ensure_non_negative("balance", new.balance)?;
        let user = self.store.transaction(|tx| {
            if tx.user_by_username(&new.username)?.is_some() {
                return Err(EngineError::conflict("User", new.username.clone()));
            }
            tx.insert_user(id, new)
        })?;

        debug!(user = %user.id, username = %user.username, role = %user.role, "registered user");
        Ok(user)
    }

    /// Add an item to the catalog on behalf of `caller`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller does not exist
    /// - The caller's role may not manage the catalog (`Forbidden`)
    /// - The price or borrow price is negative (`InvalidAmount`)
    /// - An item with the same name and author exists (`ConflictAlreadyExists`)
    pub fn create_item(&self, caller: UserId, new: NewItem) -> Result<Item, EngineError> {
        let item = self.store.transaction(|tx| {
            let admin = guards::load_user(tx, caller)?;
            if !admin.role.can_manage_catalog() {
                return Err(EngineError::forbidden(caller, "create items"));
            }
            Self::insert_unique(tx, None, new)
        })?;

        debug!(item = %item.id, name = %item.name, "created item");
        Ok(item)
    }

    /// Insert an item with a fixed id, bypassing the role check
    pub fn import_item(&self, id: Option<ItemId>, new: NewItem) -> Result<Item, EngineError> {
        self.store
            .transaction(|tx| Self::insert_unique(tx, id, new))
    }

    /// Remove an item from the catalog on behalf of `caller`
    ///
    /// Its cart reservations and favorites go with it. Ownership and closed
    /// borrow history are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller or the item does not exist
    /// - The caller's role may not manage the catalog (`Forbidden`)
    /// - Units of the item are still on loan (`ItemInUse`)
    pub fn delete_item(&self, caller: UserId, item: ItemId) -> Result<(), EngineError> {
        self.store.transaction(|tx| {
            let admin = guards::load_user(tx, caller)?;
            if !admin.role.can_manage_catalog() {
                return Err(EngineError::forbidden(caller, "delete items"));
            }
            guards::load_item(tx, item)?;

            let open_borrows = tx.open_borrow_count(item)?;
            if open_borrows > 0 {
                return Err(EngineError::ItemInUse { item, open_borrows });
            }
            tx.delete_item(item)?;
            Ok(())
        })?;

        debug!(%item, "deleted item");
        Ok(())
    }

    /// All items ordered by id
    pub fn list_items(&self) -> Result<Vec<Item>, EngineError> {
        self.store.transaction(|tx| tx.items())
    }

    pub fn get_item(&self, item: ItemId) -> Result<Item, EngineError> {
        self.store.transaction(|tx| guards::load_item(tx, item))
    }

    pub fn get_user(&self, user: UserId) -> Result<User, EngineError> {
        self.store.transaction(|tx| guards::load_user(tx, user))
    }

    /// Mark an item as a favorite; marking it twice is a no-op
    pub fn add_favorite(&self, user: UserId, item: ItemId) -> Result<(), EngineError> {
        self.store.transaction(|tx| {
            guards::load_user(tx, user)?;
            guards::load_item(tx, item)?;
            tx.add_favorite(user, item)?;
            Ok(())
        })
    }

    /// The user's favorite items, ordered by item id
    pub fn list_favorites(&self, user: UserId) -> Result<Vec<Item>, EngineError> {
        self.store.transaction(|tx| {
            guards::load_user(tx, user)?;
            let mut items = Vec::new();
            for item in tx.favorites(user)? {
                if let Some(item) = tx.item(item)? {
                    items.push(item);
                }
            }
            Ok(items)
        })
    }

    /// Unmark a favorite; unmarking an item that is not a favorite is a no-op
    pub fn remove_favorite(&self, user: UserId, item: ItemId) -> Result<(), EngineError> {
        self.store.transaction(|tx| {
            guards::load_user(tx, user)?;
            tx.remove_favorite(user, item)?;
            Ok(())
        })
    }

    fn insert_unique(
        tx: &mut dyn LedgerTx,
        id: Option<ItemId>,
        new: NewItem,
    ) -> Result<Item, EngineError> {
        guards::ensure_non_negative("price", new.price)?;
        guards::ensure_non_negative("borrow price", new.borrow_price)?;
        if tx.items()?.iter().any(|item| new.same_title(item)) {
            return Err(EngineError::conflict(
                "Item",
                format!("{} by {}", new.name, new.author),
            ));
        }
        tx.insert_item(id, new)
    }
}
