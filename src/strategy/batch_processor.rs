//! Batch processing with user-based partitioning for concurrent replay
//!
//! The `BatchProcessor` partitions a batch of operations by user. Each user's
//! operations run in file order on the blocking pool, while different users
//! run in parallel. Conflicts between users (two buyers racing for the last
//! unit) are settled by the ledger store's transactions, not by the
//! partitioning.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── InventoryEngine<S>                (shared, cloneable engine)
//!     └── Arc<DashMap<&str, usize>>         (outcome tallies across tasks)
//! ```

use crate::core::{InventoryEngine, LedgerStore};
use crate::strategy::{apply_logged, outcome_key};
use crate::types::{EngineError, Operation, UserId};
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::error;

/// Result of applying a single operation
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    pub operation: Operation,
    pub result: Result<(), EngineError>,
}

/// Batch processor with user-based partitioning
pub struct BatchProcessor<S> {
    engine: InventoryEngine<S>,
    tallies: Arc<DashMap<&'static str, usize>>,
}

impl<S> Clone for BatchProcessor<S> {
    fn clone(&self) -> Self {
        BatchProcessor {
            engine: self.engine.clone(),
            tallies: Arc::clone(&self.tallies),
        }
    }
}

impl<S: LedgerStore + 'static> BatchProcessor<S> {
    pub fn new(engine: InventoryEngine<S>) -> Self {
        Self {
            engine,
            tallies: Arc::new(DashMap::new()),
        }
    }

    /// Partition a batch of operations by user
    ///
    /// Each operation appears in exactly one partition, and each partition
    /// keeps the original order of its user's operations.
    pub fn partition_by_user(&self, batch: Vec<Operation>) -> HashMap<UserId, Vec<Operation>> {
        let mut user_batches: HashMap<UserId, Vec<Operation>> = HashMap::new();

        for operation in batch {
            user_batches
                .entry(operation.user())
                .or_default()
                .push(operation);
        }

        user_batches
    }

    /// Apply one user's operations sequentially, in order
    ///
    /// Every operation is applied even if earlier ones fail.
    pub fn process_user_operations(&self, operations: Vec<Operation>) -> Vec<OperationOutcome> {
        let mut outcomes = Vec::with_capacity(operations.len());

        for operation in operations {
            let result = apply_logged(&self.engine, &operation);
            *self.tallies.entry(outcome_key(&result)).or_default() += 1;
            outcomes.push(OperationOutcome { operation, result });
        }

        outcomes
    }

    /// Apply a batch with user-based partitioning
    ///
    /// Spawns one blocking task per user and waits for all of them. Outcomes
    /// of different users may interleave in the returned vector.
    pub async fn process_batch(&self, batch: Vec<Operation>) -> Vec<OperationOutcome> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_user, operations) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                processor.process_user_operations(operations)
            }));
        }

        let mut outcomes = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_outcomes) => outcomes.extend(user_outcomes),
                Err(join_error) => error!(%join_error, "replay task panicked"),
            }
        }

        outcomes
    }

    /// Outcome counts so far, keyed by `applied` or error kind
    pub fn tallies(&self) -> BTreeMap<String, usize> {
        self.tallies
            .iter()
            .map(|entry| (entry.key().to_string(), *entry.value()))
            .collect()
    }
}
