use crate::core::LedgerConfig;
use crate::strategy::BatchConfig;
use crate::types::NodeId;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Process token ledger operations with account balance transfers
#[derive(Parser, Debug)]
#[command(name = "token-ledger")]
#[command(about = "Process token ledger operations with account balance transfers", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing ledger operations
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy to use
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "concurrent",
        help = "Processing strategy: 'sync' for single-threaded or 'concurrent' for batched multi-threaded"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (concurrent mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of partitions processing concurrently (concurrent mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of partitions processing concurrently (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    /// Canonical name of the node this engine operates for
    #[arg(long = "local-node", value_name = "NODE", default_value = "PartyA")]
    pub local_node: String,

    /// Canonical name of the node token issuance is attributed to
    #[arg(long = "issuer-node", value_name = "NODE", default_value = "PartyA")]
    pub issuer_node: String,

    /// Business reference of the ledger's unit token type
    #[arg(long = "token", value_name = "REFERENCE", default_value = "DVT")]
    pub token_reference: String,

    /// Decimal places balances are quoted and reported in
    #[arg(long = "fraction-digits", value_name = "DIGITS", default_value_t = 2)]
    pub fraction_digits: u32,
}

/// Available processing strategies
#[derive(Clone, Debug, ValueEnum)]
pub enum StrategyType {
    Sync,
    Concurrent,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Uses the provided values where given, falling back to defaults, and
    /// lets `BatchConfig::new` reject zero values.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent.unwrap_or(default.max_concurrent),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create the engine configuration from CLI arguments
    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            local_node: NodeId::new(self.local_node.clone()),
            issuer_node: NodeId::new(self.issuer_node.clone()),
            token_reference: self.token_reference.clone(),
            fraction_digits: self.fraction_digits,
        }
    }
}
