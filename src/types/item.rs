//! Catalog item types
//!
//! An item's `stock` is the single source of truth for availability: it is
//! decremented by purchases and borrows and incremented by returns. Cart
//! reservations never touch it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Catalog item (a book)
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub author: String,
    pub genre: String,
    pub description: String,

    /// Price of one unit when bought
    pub price: Decimal,

    /// Price of one loan, independent of its length
    pub borrow_price: Decimal,

    /// Units currently available for purchase or borrow
    pub stock: u32,
}

impl Item {
    /// Build an item row from its catalog input
    pub fn from_new(id: ItemId, new: NewItem) -> Self {
        Item {
            id,
            name: new.name,
            author: new.author,
            genre: new.genre,
            description: new.description,
            price: new.price,
            borrow_price: new.borrow_price,
            stock: new.stock,
        }
    }
}

/// Catalog input for a new item
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub price: Decimal,
    pub borrow_price: Decimal,
    pub stock: u32,
}

impl NewItem {
    /// Minimal item with empty descriptive fields
    pub fn new(
        name: impl Into<String>,
        author: impl Into<String>,
        price: Decimal,
        borrow_price: Decimal,
        stock: u32,
    ) -> Self {
        NewItem {
            name: name.into(),
            author: author.into(),
            genre: String::new(),
            description: String::new(),
            price,
            borrow_price,
            stock,
        }
    }

    /// Whether this input names the same title as an existing item
    pub fn same_title(&self, item: &Item) -> bool {
        self.name == item.name && self.author == item.author
    }
}
