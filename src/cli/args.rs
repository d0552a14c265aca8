use crate::core::config::{DEFAULT_CART_TTL_SECS, DEFAULT_MAX_LOAN_DAYS};
use crate::core::EngineConfig;
use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay inventory operations against a seeded ledger
#[derive(Parser, Debug)]
#[command(name = "inventory-engine")]
#[command(about = "Replay purchase, borrow, and cart operations against a seeded inventory", long_about = None)]
pub struct CliArgs {
    /// Seed CSV file with the starting users and items
    #[arg(long = "seed", value_name = "SEED", help = "Path to the seed CSV file")]
    pub seed_file: PathBuf,

    /// Operations CSV file, applied in order
    #[arg(value_name = "OPS", help = "Path to the operations CSV file")]
    pub operations_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Replay strategy: 'sync' applies operations in file order, 'async' runs users in parallel"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Worker threads applying a batch (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    #[arg(
        long = "cart-ttl-secs",
        value_name = "SECS",
        default_value_t = DEFAULT_CART_TTL_SECS,
        help = "Lifetime of a cart reservation in seconds"
    )]
    pub cart_ttl_secs: i64,

    #[arg(
        long = "max-loan-days",
        value_name = "DAYS",
        default_value_t = DEFAULT_MAX_LOAN_DAYS,
        help = "Longest loan a borrow may request"
    )]
    pub max_loan_days: u32,
}

/// Available replay strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values use the defaults; zero values fall back to the defaults
    /// with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.cart_ttl_secs, self.max_loan_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "--seed", "seed.csv", "ops.csv"], StrategyType::Sync)]
    #[case::explicit_sync(&["program", "--seed", "seed.csv", "--strategy", "sync", "ops.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["program", "--seed", "seed.csv", "--strategy", "async", "ops.csv"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
        assert_eq!(parsed.seed_file, PathBuf::from("seed.csv"));
        assert_eq!(parsed.operations_file, PathBuf::from("ops.csv"));
    }

    #[rstest]
    #[case::all_defaults(&["program", "--seed", "s.csv", "o.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--seed", "s.csv", "--batch-size", "2000", "o.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--seed", "s.csv", "--max-concurrent", "8", "o.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--seed", "s.csv", "--batch-size", "0", "o.csv"], 1000, num_cpus::get())]
    #[case::zero_max_concurrent(&["program", "--seed", "s.csv", "--max-concurrent", "0", "o.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent_batches, expected_max_concurrent);
    }

    #[rstest]
    #[case::defaults(&["program", "--seed", "s.csv", "o.csv"], 300, 365)]
    #[case::custom(&["program", "--seed", "s.csv", "--cart-ttl-secs", "60", "--max-loan-days", "30", "o.csv"], 60, 30)]
    #[case::zero_values_fall_back(&["program", "--seed", "s.csv", "--cart-ttl-secs", "0", "--max-loan-days", "0", "o.csv"], 300, 365)]
    fn test_engine_config_conversion(
        #[case] args: &[&str],
        #[case] expected_ttl_secs: i64,
        #[case] expected_max_loan_days: u32,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_engine_config();

        assert_eq!(config.cart_ttl, Duration::seconds(expected_ttl_secs));
        assert_eq!(config.max_loan_days, expected_max_loan_days);
    }

    #[rstest]
    #[case::missing_operations(&["program", "--seed", "seed.csv"])]
    #[case::missing_seed(&["program", "ops.csv"])]
    #[case::invalid_strategy(&["program", "--seed", "s.csv", "--strategy", "invalid", "o.csv"])]
    #[case::negative_loan_days(&["program", "--seed", "s.csv", "--max-loan-days", "-1", "o.csv"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
