//! Core business logic module
//!
//! This module contains the inventory and balance components:
//! - `traits` - The ledger store seam the engine runs its transactions against
//! - `ledger_store` - In-memory reference ledger store
//! - `guards` - Balance and stock checks shared by every mutating operation
//! - `engine` - Purchase, batch purchase, borrow, return, and checkout
//! - `cart` - Cart reservation policy and cart operations
//! - `catalog` - Catalog and favorites accessors
//! - `config` - Engine configuration
//! - `clock` - Injected clocks

pub mod cart;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod guards;
pub mod ledger_store;
pub mod traits;

pub use cart::CartPolicy;
pub use catalog::Catalog;
pub use clock::{system_clock, ManualClock, SharedClock};
pub use config::EngineConfig;
pub use engine::InventoryEngine;
pub use ledger_store::{LedgerSnapshot, MemoryLedger, TableCounts};
pub use traits::{LedgerStore, LedgerTx};
