//! Synchronous processing strategy
//!
//! Single-threaded pipeline: stream rows through the SyncReader, apply each
//! operation to the engine in order, then write the balance report. Row-level
//! failures are logged and skipped; memory stays O(accounts), not O(rows).

use crate::core::{LedgerConfig, TransferEngine};
use crate::io::csv_format::write_balances_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::ProcessingStrategy;
use crate::types::LedgerError;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Synchronous processing strategy
///
/// Processes operations strictly in file order, which makes it the reference
/// behavior the concurrent strategy is measured against.
#[derive(Debug, Clone)]
pub struct SyncProcessingStrategy {
    config: LedgerConfig,
}

impl SyncProcessingStrategy {
    /// Create a strategy with the given engine configuration
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        let engine = TransferEngine::new(self.config.clone())?;
        let reader = SyncReader::new(input_path)?;

        for result in reader {
            match result {
                Ok(operation) => {
                    if let Err(e) = engine.apply_operation(&operation) {
                        warn!("operation failed: {}", e);
                    }
                }
                Err(e) => {
                    warn!("row skipped: {}", e);
                }
            }
        }

        write_balances_csv(
            &engine.balance_summaries(),
            self.config.fraction_digits,
            output,
        )
        .map_err(|message| LedgerError::IoError { message })?;

        Ok(())
    }
}
