//! I/O module
//!
//! Handles CSV parsing and output for the replay driver.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `sync_reader` - Synchronous CSV readers with iterator interface
//! - `async_reader` - Asynchronous operations reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_operation_record, convert_seed_record, write_inventory_csv, OperationRecord,
    SeedEntry, SeedRecord,
};
pub use sync_reader::{OperationReader, SeedReader, SyncReader};
