//! Inventory engine CLI
//!
//! Replays an operations CSV against a seeded in-memory ledger and prints the
//! final users and items as CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --seed seed.csv operations.csv > inventory.csv
//! cargo run -- --seed seed.csv --strategy async --batch-size 500 operations.csv > inventory.csv
//! RUST_LOG=info cargo run -- --seed seed.csv --cart-ttl-secs 60 operations.csv
//! ```
//!
//! # Replay Strategies
//!
//! - **sync**: Applies operations one at a time in file order (default)
//! - **async**: Applies batches with one task per user, users in parallel
//!
//! # Exit Codes
//!
//! - 0: Success (rejected operations and skipped rows do not fail the run)
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use rust_inventory_engine::{cli, logging, strategy};
use std::process;
use tracing::error;

fn main() {
    logging::init();

    let args = cli::parse_args();

    let strategy = {
        let batch_config = if args.strategy == cli::StrategyType::Async {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, args.to_engine_config(), batch_config)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.replay(&args.seed_file, &args.operations_file, &mut output) {
        error!(error = %e, "replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
