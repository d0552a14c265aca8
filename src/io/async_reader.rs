//! Asynchronous CSV reader with batch interface
//!
//! Reads operation records from any async byte stream in fixed-size batches.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Operations
//!                  ↓
//!           csv_format module
//!           (OperationRecord, convert_operation_record)
//! ```

use crate::io::csv_format::{convert_operation_record, OperationRecord};
use crate::types::Operation;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
///
/// Provides batch reading interface over operation records.
/// Maintains streaming behavior with constant memory usage.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    skipped: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            skipped: 0,
        }
    }

    /// Read a batch of operations
    ///
    /// Reads up to `batch_size` valid operations. Rows that fail to parse or
    /// convert are logged, counted, and skipped.
    ///
    /// # Returns
    ///
    /// The operations in file order; empty once the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<OperationRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(record)) => match convert_operation_record(record) {
                    Ok(operation) => batch.push(operation),
                    Err(error) => {
                        warn!(%error, "skipping operation record");
                        self.skipped += 1;
                    }
                },
                Some(Err(error)) => {
                    warn!(%error, "skipping unparseable operation row");
                    self.skipped += 1;
                }
                None => break,
            }
        }

        batch
    }

    /// Rows skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
