//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `user`: users, roles, and identifiers
//! - `item`: catalog items and identifiers
//! - `records`: ownership, borrow, and cart reservation rows plus listing entries
//! - `operation`: engine calls as data, for replay
//! - `error`: Error types for the inventory engine

pub mod error;
pub mod item;
pub mod operation;
pub mod records;
pub mod user;

pub use error::EngineError;
pub use item::{Item, ItemId, NewItem};
pub use operation::Operation;
pub use records::{
    BorrowId, BorrowRecord, BorrowedEntry, CartEntry, CartReservation, OwnedEntry, Ownership,
    PurchaseLine,
};
pub use user::{NewUser, Role, User, UserId};
