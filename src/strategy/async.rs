//! Asynchronous batch replay strategy
//!
//! Multi-threaded implementation of the ReplayStrategy trait. Operations are
//! read in batches and each batch is partitioned by user, so one user's
//! operations keep their file order while different users run in parallel.
//!
//! # Architecture
//!
//! ```text
//! AsyncReplayStrategy
//!     ├── EngineConfig (cart TTL, loan bound)
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (user partitioning + blocking tasks)
//!         └── InventoryEngine<MemoryLedger>
//! ```
//!
//! Batches are processed one after another. A user whose operations span two
//! batches therefore sees them applied in file order. Operations of different
//! users inside a batch may commit in any order, so outcomes that depend on a
//! race (who gets the last unit) can differ from the sequential strategy.

use crate::core::EngineConfig;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_inventory_csv;
use crate::strategy::{seeded_engine, BatchProcessor, ReplayStrategy, ReplaySummary};
use crate::types::EngineError;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Configuration for batch replay
///
/// Controls how operations are batched and the number of worker threads
/// for parallel processing within each batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Number of worker threads applying a batch
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values are replaced by their defaults.
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid max concurrent batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch replay strategy
#[derive(Debug, Clone, Default)]
pub struct AsyncReplayStrategy {
    engine_config: EngineConfig,
    batch_config: BatchConfig,
}

impl AsyncReplayStrategy {
    /// Create a new AsyncReplayStrategy
    ///
    /// # Arguments
    ///
    /// * `engine_config` - Cart and loan settings for the engine
    /// * `batch_config` - Batch size and worker thread count
    pub fn new(engine_config: EngineConfig, batch_config: BatchConfig) -> Self {
        Self {
            engine_config,
            batch_config,
        }
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch_config
    }
}

impl ReplayStrategy for AsyncReplayStrategy {
    fn replay(
        &self,
        seed_path: &Path,
        operations_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, EngineError> {
        let workers = self.batch_config.max_concurrent_batches;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .max_blocking_threads(workers)
            .build()
            .map_err(|e| EngineError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        let (engine, seed_skipped) = seeded_engine(seed_path, &self.engine_config)?;
        let ledger = std::sync::Arc::clone(engine.store());
        let processor = BatchProcessor::new(engine);

        let operations_skipped = runtime.block_on(async {
            let file = tokio::fs::File::open(operations_path)
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::NotFound => EngineError::FileNotFound {
                        path: operations_path.display().to_string(),
                    },
                    _ => EngineError::IoError {
                        message: format!(
                            "Failed to open file '{}': {}",
                            operations_path.display(),
                            e
                        ),
                    },
                })?;

            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut batches = 0usize;
            loop {
                let batch = reader.read_batch(self.batch_config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                batches += 1;
                debug!(batch = batches, operations = batch.len(), "applying batch");
                processor.process_batch(batch).await;
            }

            Ok::<usize, EngineError>(reader.skipped())
        })?;

        let summary = ReplaySummary {
            outcomes: processor.tallies(),
            skipped: seed_skipped + operations_skipped,
        };

        write_inventory_csv(&ledger.snapshot(), output)
            .map_err(|message| EngineError::IoError { message })?;

        summary.log();
        Ok(summary)
    }
}
