//! Token Ledger CLI
//!
//! Command-line interface for processing ledger operations from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > balances.csv
//! cargo run -- --strategy sync operations.csv > balances.csv
//! cargo run -- --strategy concurrent --batch-size 2000 --max-concurrent 8 operations.csv > balances.csv
//! ```
//!
//! The program reads ledger operations from the input CSV file, processes
//! them through the balance engine using the selected strategy, and writes
//! the final account balances to stdout. Diagnostics go to stderr (controlled
//! via `RUST_LOG`), so stdout stays a clean CSV report.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Fatal error (missing arguments, file not found, I/O error, etc.)

use token_ledger_engine::boundary::ResponseEnvelope;
use token_ledger_engine::cli;
use token_ledger_engine::strategy;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // Diagnostics to stderr; stdout is reserved for the balance report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    let batch = matches!(args.strategy, cli::StrategyType::Concurrent)
        .then(|| args.to_batch_config());
    let strategy = strategy::create_strategy(args.strategy.clone(), args.to_ledger_config(), batch);

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        // Surface fatal failures in the boundary envelope shape
        let envelope = ResponseEnvelope::failure(&e);
        match serde_json::to_string(&envelope) {
            Ok(rendered) => eprintln!("{}", rendered),
            Err(_) => eprintln!("Error: {}", e),
        }
        process::exit(1);
    }
}
