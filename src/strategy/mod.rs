//! Processing strategy module
//!
//! This module defines the Strategy pattern for complete operation processing
//! pipelines, encompassing CSV parsing, engine execution and report output.
//! This allows different processing implementations (synchronous, concurrent
//! batch) to be selected at runtime.

use crate::cli::StrategyType;
use crate::core::LedgerConfig;
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;

pub mod concurrent;
pub mod sync;

pub use concurrent::{BatchConfig, ConcurrentProcessingStrategy};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete operation processing pipelines
///
/// Each strategy reads operations from a CSV file, runs them through a
/// transfer engine, and writes the final balance report to the output.
pub trait ProcessingStrategy: Send + Sync {
    /// Process operations from the input file and write the report to output
    ///
    /// Individual operation failures are logged and processing continues;
    /// only fatal conditions (file not found, I/O failure, invalid engine
    /// configuration) abort the run with an error.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError>;
}

/// Create a processing strategy for the given strategy type
///
/// # Arguments
///
/// * `strategy_type` - Sync or Concurrent
/// * `config` - Engine configuration shared by both strategies
/// * `batch` - Batch configuration; only used by the concurrent strategy
pub fn create_strategy(
    strategy_type: StrategyType,
    config: LedgerConfig,
    batch: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(config)),
        StrategyType::Concurrent => {
            let batch = batch.unwrap_or_default();
            Box::new(ConcurrentProcessingStrategy::new(config, batch))
        }
    }
}
