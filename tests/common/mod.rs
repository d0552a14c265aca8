//! Shared setup for the integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_inventory_engine::core::{Catalog, EngineConfig, InventoryEngine, ManualClock, MemoryLedger};
use rust_inventory_engine::types::{Item, ItemId, NewItem, NewUser, Role, UserId};
use std::sync::Arc;

pub struct Shop {
    pub ledger: Arc<MemoryLedger>,
    pub clock: Arc<ManualClock>,
    pub catalog: Catalog<MemoryLedger>,
    pub engine: InventoryEngine<MemoryLedger>,
}

pub fn opening_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
}

pub fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

impl Shop {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let clock = Arc::new(ManualClock::new(opening_time()));
        let catalog = Catalog::new(Arc::clone(&ledger));
        let engine = InventoryEngine::new(Arc::clone(&ledger), clock.clone(), config);
        Shop {
            ledger,
            clock,
            catalog,
            engine,
        }
    }

    pub fn user(&self, username: &str, balance: Decimal) -> UserId {
        self.catalog
            .register_user(NewUser {
                username: username.to_string(),
                display_name: username.to_string(),
                credential_hash: String::new(),
                balance,
                role: Role::User,
            })
            .unwrap()
            .id
    }

    pub fn book(&self, name: &str, price: Decimal, borrow_price: Decimal, stock: u32) -> ItemId {
        self.catalog
            .import_item(None, NewItem::new(name, "Anon", price, borrow_price, stock))
            .unwrap()
            .id
    }

    pub fn item(&self, item: ItemId) -> Item {
        self.catalog.get_item(item).unwrap()
    }

    pub fn stock(&self, item: ItemId) -> u32 {
        self.item(item).stock
    }

    pub fn balance(&self, user: UserId) -> Decimal {
        self.engine.balance(user).unwrap()
    }

    pub fn owned(&self, user: UserId, item: ItemId) -> u32 {
        self.engine
            .list_owned(user)
            .unwrap()
            .into_iter()
            .find(|entry| entry.item.id == item)
            .map_or(0, |entry| entry.quantity)
    }
}
