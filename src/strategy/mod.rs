//! Replay strategy module
//!
//! This module defines the Strategy pattern for complete replay pipelines:
//! seed a ledger from CSV, replay a CSV stream of engine operations against
//! it, and write the final inventory. Different implementations (sequential,
//! concurrent batches) can be selected at runtime.

use crate::cli::StrategyType;
use crate::core::{Catalog, EngineConfig, InventoryEngine, LedgerStore, MemoryLedger};
use crate::io::{SeedEntry, SeedReader};
use crate::types::{EngineError, Operation};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub mod r#async;
pub mod batch_processor;
pub mod sync;

pub use self::r#async::{AsyncReplayStrategy, BatchConfig};
pub use batch_processor::BatchProcessor;
pub use sync::SyncReplayStrategy;

/// Tally key for committed operations
pub const APPLIED: &str = "applied";

/// Replay strategy trait for complete replay pipelines
pub trait ReplayStrategy: Send + Sync {
    /// Seed a ledger, replay operations against it, and write the result
    ///
    /// # Arguments
    ///
    /// * `seed_path` - CSV file of users and items to start from
    /// * `operations_path` - CSV file of engine operations, in order
    /// * `output` - Writer receiving the final inventory CSV
    ///
    /// # Returns
    ///
    /// Outcome counts of the replay
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input file cannot be opened (file not found, permission denied)
    /// - A fatal I/O error occurs during reading or writing
    ///
    /// Rejected operations and malformed rows are logged and counted, and
    /// replay continues with the next operation.
    fn replay(
        &self,
        seed_path: &Path,
        operations_path: &Path,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, EngineError>;
}

/// Outcome counts of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Operations per outcome: `applied` or an error kind
    pub outcomes: BTreeMap<String, usize>,
    /// Seed and operation rows that could not be parsed or loaded
    pub skipped: usize,
}

impl ReplaySummary {
    /// Count the result of one operation
    pub fn record(&mut self, result: &Result<(), EngineError>) {
        *self.outcomes.entry(outcome_key(result).to_string()).or_default() += 1;
    }

    pub fn applied(&self) -> usize {
        self.outcomes.get(APPLIED).copied().unwrap_or(0)
    }

    pub fn rejected(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(key, _)| key.as_str() != APPLIED)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn log(&self) {
        info!(
            applied = self.applied(),
            rejected = self.rejected(),
            skipped = self.skipped,
            outcomes = ?self.outcomes,
            "replay finished"
        );
    }
}

/// Tally key of an operation result
pub fn outcome_key(result: &Result<(), EngineError>) -> &'static str {
    match result {
        Ok(()) => APPLIED,
        Err(error) => error.kind(),
    }
}

/// Apply one operation, logging a rejection
pub fn apply_logged<S: LedgerStore>(
    engine: &InventoryEngine<S>,
    operation: &Operation,
) -> Result<(), EngineError> {
    let result = engine.apply(operation);
    if let Err(error) = &result {
        warn!(operation = %operation, kind = error.kind(), %error, "operation rejected");
    }
    result
}

/// Load a seed CSV into a fresh in-memory ledger
///
/// Users and items keep the ids given in the file. Rows that fail to parse
/// or collide with an earlier row are logged and skipped.
///
/// # Returns
///
/// The ledger and the number of skipped rows
///
/// # Errors
///
/// Returns an error if the seed file cannot be opened.
pub fn load_seed(seed_path: &Path) -> Result<(Arc<MemoryLedger>, usize), EngineError> {
    let ledger = Arc::new(MemoryLedger::new());
    let catalog = Catalog::new(Arc::clone(&ledger));
    let mut skipped = 0;

    for row in SeedReader::open(seed_path)? {
        let loaded = row.map_err(|message| EngineError::ParseError {
            line: None,
            message,
        });
        let loaded = loaded.and_then(|entry| match entry {
            SeedEntry::User { id, user } => catalog.import_user(Some(id), user).map(|_| ()),
            SeedEntry::Item { id, item } => catalog.import_item(Some(id), item).map(|_| ()),
        });
        if let Err(error) = loaded {
            warn!(%error, "skipping seed row");
            skipped += 1;
        }
    }

    Ok((ledger, skipped))
}

/// Build an engine over a freshly seeded ledger
pub fn seeded_engine(
    seed_path: &Path,
    config: &EngineConfig,
) -> Result<(InventoryEngine<MemoryLedger>, usize), EngineError> {
    let (ledger, skipped) = load_seed(seed_path)?;
    let engine = InventoryEngine::new(ledger, crate::core::system_clock(), config.clone());
    Ok((engine, skipped))
}

/// Create a replay strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of replay strategy to create (Sync or Async)
/// * `engine_config` - Cart and loan settings for the engine
/// * `batch_config` - Optional configuration for async batch replay (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ReplayStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    engine_config: EngineConfig,
    batch_config: Option<BatchConfig>,
) -> Box<dyn ReplayStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncReplayStrategy::new(engine_config)),
        StrategyType::Async => {
            let batch_config = batch_config.unwrap_or_default();
            Box::new(AsyncReplayStrategy::new(engine_config, batch_config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemId, UserId};
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_load_seed_keeps_ids_and_skips_bad_rows() {
        let seed = create_temp_csv(
            "kind,id,name,author,role,balance,price,borrow_price,stock\n\
             user,5,alice,,,10.00,,,\n\
             user,6,alice,,,10.00,,,\n\
             item,9,Dune,Herbert,,,9.99,1.00,2\n\
             item,10,Emma,Austen,,,oops,1.00,2\n",
        );

        let (ledger, skipped) = load_seed(seed.path()).unwrap();
        let snapshot = ledger.snapshot();

        assert_eq!(skipped, 2);
        assert_eq!(snapshot.users.len(), 1);
        assert_eq!(snapshot.users[0].id, UserId(5));
        assert_eq!(snapshot.items[0].id, ItemId(9));
    }

    #[test]
    fn test_load_seed_missing_file() {
        let result = load_seed(Path::new("missing-seed.csv"));
        assert!(matches!(result, Err(EngineError::FileNotFound { .. })));
    }

    #[test]
    fn test_summary_counts_by_outcome() {
        let mut summary = ReplaySummary::default();
        summary.record(&Ok(()));
        summary.record(&Ok(()));
        summary.record(&Err(EngineError::insufficient_stock(ItemId(1), 0, 1)));
        summary.record(&Err(EngineError::user_not_found(UserId(3))));

        assert_eq!(summary.applied(), 2);
        assert_eq!(summary.rejected(), 2);
        assert_eq!(summary.outcomes.get("insufficient_stock"), Some(&1));
        assert_eq!(summary.outcomes.get("not_found"), Some(&1));
    }
}
