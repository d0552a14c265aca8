//! CSV format handling for seed rows, operation records, and inventory output
//!
//! This module centralizes all CSV format concerns, providing:
//! - `SeedRecord` and `OperationRecord` structures for deserialization
//! - Conversion from CSV records to domain types
//! - Inventory snapshot serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::core::LedgerSnapshot;
use crate::types::{ItemId, NewItem, NewUser, Operation, PurchaseLine, Role, UserId};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Seed CSV row
///
/// Columns: kind, id, name, author, role, balance, price, borrow_price, stock.
/// `user` rows use name, role, and balance; `item` rows use name, author,
/// price, borrow_price, and stock.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct SeedRecord {
    pub kind: String,
    pub id: u32,
    pub name: Option<String>,
    pub author: Option<String>,
    pub role: Option<String>,
    pub balance: Option<String>,
    pub price: Option<String>,
    pub borrow_price: Option<String>,
    pub stock: Option<u32>,
}

/// A converted seed row
#[derive(Debug, Clone, PartialEq)]
pub enum SeedEntry {
    User { id: UserId, user: NewUser },
    Item { id: ItemId, item: NewItem },
}

/// Operations CSV row
///
/// Columns: op, user, item, quantity, days. For `batch` the item column holds
/// `id:qty` pairs separated by `|`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct OperationRecord {
    pub op: String,
    pub user: u32,
    pub item: Option<String>,
    pub quantity: Option<u32>,
    pub days: Option<u32>,
}

fn required<'a>(field: &'a Option<String>, name: &str, context: &str) -> Result<&'a str, String> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(format!("Missing {} for {}", name, context)),
    }
}

fn parse_money(field: &Option<String>, name: &str, context: &str) -> Result<Decimal, String> {
    let raw = required(field, name, context)?;
    let amount = Decimal::from_str(raw)
        .map_err(|_| format!("Invalid {} '{}' for {}", name, raw, context))?;
    if amount.is_sign_negative() {
        return Err(format!("Negative {} '{}' for {}", name, raw, context));
    }
    Ok(amount)
}

/// Convert a SeedRecord to a SeedEntry
///
/// # Arguments
///
/// * `record` - The deserialized seed row
///
/// # Returns
///
/// Result containing either:
/// - Ok(SeedEntry) - A user or item ready to insert
/// - Err(String) - Error message describing the conversion failure
pub fn convert_seed_record(record: SeedRecord) -> Result<SeedEntry, String> {
    match record.kind.to_lowercase().as_str() {
        "user" => {
            let context = format!("user {}", record.id);
            let username = required(&record.name, "name", &context)?.to_string();
            let balance = parse_money(&record.balance, "balance", &context)?;
            let role = match record.role.as_deref() {
                Some(role) => Role::from_str(role).map_err(|e| format!("{} for {}", e, context))?,
                None => Role::User,
            };

            Ok(SeedEntry::User {
                id: UserId(record.id),
                user: NewUser {
                    display_name: username.clone(),
                    username,
                    credential_hash: String::new(),
                    balance,
                    role,
                },
            })
        }
        "item" => {
            let context = format!("item {}", record.id);
            let name = required(&record.name, "name", &context)?;
            let author = required(&record.author, "author", &context)?;
            let price = parse_money(&record.price, "price", &context)?;
            let borrow_price = parse_money(&record.borrow_price, "borrow_price", &context)?;
            let stock = record
                .stock
                .ok_or_else(|| format!("Missing stock for {}", context))?;

            Ok(SeedEntry::Item {
                id: ItemId(record.id),
                item: NewItem::new(name, author, price, borrow_price, stock),
            })
        }
        _ => Err(format!(
            "Invalid seed kind: '{}' for id {}",
            record.kind, record.id
        )),
    }
}

fn parse_item(raw: &str, context: &str) -> Result<ItemId, String> {
    raw.trim()
        .parse::<u32>()
        .map(ItemId)
        .map_err(|_| format!("Invalid item '{}' for {}", raw, context))
}

/// Parse the `id:qty|id:qty` item column of a batch operation
pub fn parse_batch_lines(raw: &str, context: &str) -> Result<Vec<PurchaseLine>, String> {
    raw.split('|')
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (item, quantity) = line
                .split_once(':')
                .ok_or_else(|| format!("Invalid batch line '{}' for {}", line, context))?;
            let quantity = quantity
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("Invalid quantity '{}' for {}", quantity, context))?;
            Ok(PurchaseLine::new(parse_item(item, context)?, quantity))
        })
        .collect()
}

/// Convert an OperationRecord to an Operation
///
/// # Arguments
///
/// * `record` - The deserialized operation row
///
/// # Returns
///
/// Result containing either:
/// - Ok(Operation) - Successfully converted operation
/// - Err(String) - Error message describing the conversion failure
pub fn convert_operation_record(record: OperationRecord) -> Result<Operation, String> {
    let user = UserId(record.user);
    let op = record.op.to_lowercase();
    let context = format!("{} by user {}", op, user);
    let item = || parse_item(required(&record.item, "item", &context)?, &context);

    let operation = match op.as_str() {
        "purchase" => Operation::Purchase { user, item: item()? },
        "batch" => Operation::BatchPurchase {
            user,
            lines: parse_batch_lines(required(&record.item, "item", &context)?, &context)?,
        },
        "borrow" => Operation::Borrow {
            user,
            item: item()?,
            days: record
                .days
                .ok_or_else(|| format!("Missing days for {}", context))?,
        },
        "return" => Operation::Return { user, item: item()? },
        "cart_add" => Operation::AddToCart { user, item: item()? },
        "cart_remove" => Operation::RemoveFromCart { user, item: item()? },
        "checkout" => Operation::Checkout { user },
        _ => {
            return Err(format!(
                "Invalid operation: '{}' for user {}",
                record.op, user
            ))
        }
    };

    // A purchase row may carry a quantity; more than one unit is a batch of one line
    if let Operation::Purchase { user, item } = operation {
        if let Some(quantity) = record.quantity.filter(|&q| q != 1) {
            return Ok(Operation::BatchPurchase {
                user,
                lines: vec![PurchaseLine::new(item, quantity)],
            });
        }
    }

    Ok(operation)
}

/// Write the ledger snapshot to CSV format
///
/// Writes rows with columns: kind, id, name, balance, stock. User rows come
/// first, then item rows, each sorted by id. Money has two decimal places.
///
/// # Arguments
///
/// * `snapshot` - Committed users and items
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_inventory_csv(snapshot: &LedgerSnapshot, output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["kind", "id", "name", "balance", "stock"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut users = snapshot.users.clone();
    users.sort_by_key(|user| user.id);
    for user in users {
        writer
            .write_record(&[
                "user".to_string(),
                user.id.to_string(),
                user.username,
                format!("{:.2}", user.balance),
                String::new(),
            ])
            .map_err(|e| format!("Failed to write user record: {}", e))?;
    }

    let mut items = snapshot.items.clone();
    items.sort_by_key(|item| item.id);
    for item in items {
        writer
            .write_record(&[
                "item".to_string(),
                item.id.to_string(),
                item.name,
                String::new(),
                item.stock.to_string(),
            ])
            .map_err(|e| format!("Failed to write item record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
