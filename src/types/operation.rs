//! Engine operations as data
//!
//! The replay driver reads these from CSV and hands each one to
//! `InventoryEngine::apply`, which routes it to the matching operation.

use super::item::ItemId;
use super::records::PurchaseLine;
use super::user::UserId;
use std::fmt;

/// One engine call, with its inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Purchase { user: UserId, item: ItemId },
    BatchPurchase { user: UserId, lines: Vec<PurchaseLine> },
    Borrow { user: UserId, item: ItemId, days: u32 },
    Return { user: UserId, item: ItemId },
    AddToCart { user: UserId, item: ItemId },
    RemoveFromCart { user: UserId, item: ItemId },
    Checkout { user: UserId },
}

impl Operation {
    /// The user on whose behalf the operation runs
    pub fn user(&self) -> UserId {
        match self {
            Operation::Purchase { user, .. }
            | Operation::BatchPurchase { user, .. }
            | Operation::Borrow { user, .. }
            | Operation::Return { user, .. }
            | Operation::AddToCart { user, .. }
            | Operation::RemoveFromCart { user, .. }
            | Operation::Checkout { user } => *user,
        }
    }

    /// Name used in the operations CSV
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Purchase { .. } => "purchase",
            Operation::BatchPurchase { .. } => "batch",
            Operation::Borrow { .. } => "borrow",
            Operation::Return { .. } => "return",
            Operation::AddToCart { .. } => "cart_add",
            Operation::RemoveFromCart { .. } => "cart_remove",
            Operation::Checkout { .. } => "checkout",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by user {}", self.name(), self.user())
    }
}
