//! Synchronous CSV reader with iterator interface
//!
//! Provides streaming iterators over seed rows and operation records from a
//! CSV file. Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! `SyncReader` implements the Iterator trait, yielding `Result<T, String>`
//! for each CSV row:
//!
//! ```no_run
//! use rust_inventory_engine::io::sync_reader::OperationReader;
//! use std::path::Path;
//!
//! let reader = OperationReader::open(Path::new("operations.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(operation) => println!("Applying {}", operation),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `open()`
//! - Individual record parsing errors are yielded as Err variants in the iterator
//! - Line numbers are included in error messages for debugging

use crate::io::csv_format::{
    convert_operation_record, convert_seed_record, OperationRecord, SeedEntry, SeedRecord,
};
use crate::types::{EngineError, Operation};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Streaming reader over operation records
pub type OperationReader = SyncReader<OperationRecord, Operation>;

/// Streaming reader over seed rows
pub type SeedReader = SyncReader<SeedRecord, SeedEntry>;

/// Synchronous CSV reader
///
/// Deserializes each row as `R` and converts it into `T`. Maintains streaming
/// behavior with constant memory usage.
#[derive(Debug)]
pub struct SyncReader<R, T> {
    reader: csv::Reader<File>,
    line_num: usize,
    convert: fn(R) -> Result<T, String>,
}

impl OperationReader {
    /// Open an operations CSV file
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        SyncReader::new(path, convert_operation_record)
    }
}

impl SeedReader {
    /// Open a seed CSV file
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        SyncReader::new(path, convert_seed_record)
    }
}

impl<R: DeserializeOwned, T> SyncReader<R, T> {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing optional columns may be omitted)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file
    /// * `convert` - Conversion from the raw row to the domain type
    ///
    /// # Errors
    ///
    /// `FileNotFound` if the file does not exist, `IoError` if it cannot be
    /// opened for another reason.
    pub fn new(path: &Path, convert: fn(R) -> Result<T, String>) -> Result<Self, EngineError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => EngineError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => EngineError::IoError {
                message: format!("Failed to open file '{}': {}", path.display(), e),
            },
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
            convert,
        })
    }
}

impl<R: DeserializeOwned, T> Iterator for SyncReader<R, T> {
    type Item = Result<T, String>;

    /// Get the next converted row from the CSV file
    ///
    /// # Returns
    ///
    /// * `Some(Ok(T))` - Successfully parsed and converted row
    /// * `Some(Err(String))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<R>();
        let row = deserializer.next()?;

        // Line 1 is the header
        self.line_num += 1;
        let line = self.line_num + 1;
        Some(match row {
            Ok(record) => (self.convert)(record).map_err(|e| format!("Line {}: {}", line, e)),
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}
