//! Synchronous replay strategy
//!
//! Single-threaded implementation of the ReplayStrategy trait. It seeds an
//! in-memory ledger, streams operation records through the `OperationReader`
//! iterator, applies each one through the `InventoryEngine`, and writes the
//! final inventory with `csv_format::write_inventory_csv`.
//!
//! # Memory Efficiency
//!
//! Operation records are processed one at a time; memory grows with the
//! ledger (users, items, ownerships, borrows, cart rows), not with the length
//! of the operations file.

use crate::core::EngineConfig;
use crate::io::csv_format::write_inventory_csv;
use crate::io::sync_reader::OperationReader;
use crate::strategy::{apply_logged, seeded_engine, ReplayStrategy, ReplaySummary};
use crate::types::EngineError;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Synchronous replay strategy
///
/// # Examples
///
/// ```no_run
/// use rust_inventory_engine::core::EngineConfig;
/// use rust_inventory_engine::strategy::{ReplayStrategy, SyncReplayStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SyncReplayStrategy::new(EngineConfig::default());
/// let mut output = io::stdout();
///
/// strategy
///     .replay(Path::new("seed.csv"), Path::new("operations.csv"), &mut output)
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncReplayStrategy {
    config: EngineConfig,
}

impl SyncReplayStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl ReplayStrategy for SyncReplayStrategy {
    fn replay(
        &self,
        seed_path: &Path,
        operations_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, EngineError> {
        let (engine, seed_skipped) = seeded_engine(seed_path, &self.config)?;
        let reader = OperationReader::open(operations_path)?;

        let mut summary = ReplaySummary {
            skipped: seed_skipped,
            ..ReplaySummary::default()
        };

        for row in reader {
            match row {
                Ok(operation) => {
                    let result = apply_logged(&engine, &operation);
                    summary.record(&result);
                }
                Err(error) => {
                    warn!(%error, "skipping operation record");
                    summary.skipped += 1;
                }
            }
        }

        let snapshot = engine.store().snapshot();
        debug!(
            users = snapshot.users.len(),
            items = snapshot.items.len(),
            "writing inventory"
        );
        write_inventory_csv(&snapshot, output).map_err(|message| EngineError::IoError { message })?;

        summary.log();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const SEED: &str = "kind,id,name,author,role,balance,price,borrow_price,stock\n\
                        user,1,alice,,,20.00,,,\n\
                        user,2,bob,,,5.00,,,\n\
                        item,1,Dune,Herbert,,,10.00,1.50,1\n\
                        item,2,Emma,Austen,,,4.00,0.50,3\n";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn replay(operations: &str) -> (Result<ReplaySummary, EngineError>, String) {
        let seed = create_temp_csv(SEED);
        let ops = create_temp_csv(operations);
        let mut output = Vec::new();

        let result = SyncReplayStrategy::default().replay(seed.path(), ops.path(), &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_sync_strategy_applies_purchase() {
        let (result, output) = replay("op,user,item,quantity,days\npurchase,1,1,,\n");

        let summary = result.unwrap();
        assert_eq!(summary.applied(), 1);
        assert!(output.contains("user,1,alice,10.00,"));
        assert!(output.contains("item,1,Dune,,0"));
    }

    #[test]
    fn test_sync_strategy_last_unit_goes_to_first_buyer() {
        let (result, output) = replay(
            "op,user,item,quantity,days\n\
             purchase,2,2,,\n\
             purchase,1,1,,\n\
             purchase,2,1,,\n",
        );

        let summary = result.unwrap();
        assert_eq!(summary.applied(), 2);
        assert_eq!(summary.outcomes.get("insufficient_stock"), Some(&1));
        assert!(output.contains("user,2,bob,1.00,"));
        assert!(output.contains("item,2,Emma,,2"));
    }

    #[test]
    fn test_sync_strategy_continues_on_malformed_record() {
        let (result, output) = replay(
            "op,user,item,quantity,days\n\
             purchase,1,2,,\n\
             purchase,x,2,,\n\
             steal,1,2,,\n\
             purchase,1,2,,\n",
        );

        let summary = result.unwrap();
        assert_eq!(summary.applied(), 2);
        assert_eq!(summary.skipped, 2);
        assert!(output.contains("user,1,alice,12.00,"));
    }

    #[test]
    fn test_sync_strategy_handles_missing_operations_file() {
        let seed = create_temp_csv(SEED);
        let mut output = Vec::new();

        let result = SyncReplayStrategy::default().replay(
            seed.path(),
            Path::new("nonexistent.csv"),
            &mut output,
        );

        assert!(matches!(result, Err(EngineError::FileNotFound { .. })));
        assert!(output.is_empty());
    }

    #[test]
    fn test_sync_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SyncReplayStrategy>();
    }
}
