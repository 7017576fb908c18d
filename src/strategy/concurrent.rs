//! Concurrent batch processing strategy
//!
//! Multi-threaded pipeline over the same thread-safe engine the sync strategy
//! uses. Operations are read in batches; within a batch, account registrations
//! are applied first (they are prerequisites for everything else), then the
//! remaining operations are partitioned by the account they primarily act on
//! and the partitions run concurrently. The engine's optimistic commit
//! protects the cross-partition cases (a transfer always touches a second
//! account).
//!
//! Batches are processed sequentially, so operations on the same account keep
//! their file order even when they span batch boundaries.

use crate::core::{LedgerConfig, TransferEngine};
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_balances_csv;
use crate::strategy::ProcessingStrategy;
use crate::types::{LedgerError, Operation, TransferSource};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Configuration for batch processing
///
/// Controls how operations are batched and how many partitions run
/// concurrently within each batch.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Maximum number of partitions processing concurrently
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, falling back to defaults on zero values
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "invalid batch_size (0), using default ({})",
                default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent = if max_concurrent == 0 {
            warn!(
                "invalid max_concurrent (0), using default ({})",
                default.max_concurrent
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            batch_size,
            max_concurrent,
        }
    }
}

/// Partition a batch by the account each operation primarily acts on
///
/// Operations for the same key keep their original order inside one
/// partition; the node-level operations (issue, move, redeem) share a single
/// partition because they contend on the local node's holdings.
fn partition_by_account(batch: Vec<Operation>) -> HashMap<String, Vec<Operation>> {
    let mut partitions: HashMap<String, Vec<Operation>> = HashMap::new();
    for operation in batch {
        let key = match &operation {
            Operation::CreateAccount { name, .. } => name.clone(),
            Operation::Transfer(request) => match &request.source {
                TransferSource::Account(name) => name.clone(),
                TransferSource::Node => request.to.clone(),
            },
            Operation::Issue { .. }
            | Operation::NodeTransfer { .. }
            | Operation::Redeem { .. } => String::new(),
        };
        partitions.entry(key).or_default().push(operation);
    }
    partitions
}

/// Concurrent batch processing strategy
///
/// Safe because the engine serializes conflicting commits through per-account
/// version checks; two partitions touching the same account resolve through
/// retry rather than lost updates.
#[derive(Debug, Clone)]
pub struct ConcurrentProcessingStrategy {
    config: LedgerConfig,
    batch: BatchConfig,
}

impl ConcurrentProcessingStrategy {
    /// Create a strategy with the given engine and batch configuration
    pub fn new(config: LedgerConfig, batch: BatchConfig) -> Self {
        Self { config, batch }
    }
}

impl ProcessingStrategy for ConcurrentProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.batch.max_concurrent)
            .build()
            .map_err(|e| LedgerError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        let engine = TransferEngine::new(self.config.clone())?;

        runtime.block_on(async {
            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| LedgerError::IoError {
                    message: format!("Failed to open file '{}': {}", input_path.display(), e),
                })?;

            // Wrap tokio's file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            // Batches run one after another so same-account operations keep
            // their file order across batch boundaries.
            loop {
                let batch = reader.read_batch(self.batch.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                // Account registrations are prerequisites for the balance
                // operations of the same batch; apply them first, in file
                // order, so a transfer never races the creation of its
                // counterpart account.
                let (creates, operations): (Vec<Operation>, Vec<Operation>) = batch
                    .into_iter()
                    .partition(|op| matches!(op, Operation::CreateAccount { .. }));
                for operation in &creates {
                    if let Err(e) = engine.apply_operation(operation) {
                        warn!("operation failed: {}", e);
                    }
                }

                let partitions = partition_by_account(operations);
                stream::iter(partitions.into_values())
                    .for_each_concurrent(self.batch.max_concurrent, |operations| {
                        let engine = engine.clone();
                        async move {
                            // Partitions are CPU-bound; run each on the
                            // blocking pool so they execute in parallel
                            let joined = tokio::task::spawn_blocking(move || {
                                for operation in &operations {
                                    if let Err(e) = engine.apply_operation(operation) {
                                        warn!("operation failed: {}", e);
                                    }
                                }
                            })
                            .await;
                            if let Err(e) = joined {
                                warn!("partition task failed: {}", e);
                            }
                        }
                    })
                    .await;
            }

            Ok::<(), LedgerError>(())
        })?;

        write_balances_csv(
            &engine.balance_summaries(),
            self.config.fraction_digits,
            output,
        )
        .map_err(|message| LedgerError::IoError { message })?;

        Ok(())
    }
}
