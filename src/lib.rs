//! Token Balance Ledger Engine
//!
//! # Overview
//!
//! A standalone ledger balance engine: named accounts each hold a balance of
//! a single fungible unit, and transfers atomically move an amount from a
//! source (a named account or the untracked node balance) to a destination
//! account, enforcing non-negative balances and duplicate-name prevention and
//! producing a transaction log of applied deltas.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, TokenType, Operation, errors)
//! - [`cli`] - CLI argument parsing
//! - [`core`] - Business logic components:
//!   - [`core::registry`] - Account registry with optimistic version counters
//!   - [`core::validation`] - Pre-flight checks, run before any mutation
//!   - [`core::planner`] - Decision-table planning of deltas and node moves
//!   - [`core::ledger`] - Atomic, version-checked commit of delta pairs
//!   - [`core::journal`] - Explicit transfer state machine and delta log
//!   - [`core::vault`] - Node-level holdings (issue, move, redeem)
//!   - [`core::query`] - Read-only holdings lookups
//!   - [`core::engine`] - Orchestration of all of the above
//! - [`io`] - CSV I/O with pluggable parsing strategies
//! - [`strategy`] - Sync and concurrent processing pipelines
//! - [`boundary`] - Response envelope for driving boundaries
//!
//! # Concurrency
//!
//! Transfers touching disjoint accounts run fully in parallel. Transfers
//! sharing an account serialize through per-account version counters: a
//! commit only applies if every version read during validation is still
//! current, otherwise the transfer is re-validated and retried a bounded
//! number of times before surfacing `Conflict`.

// Module declarations
pub mod boundary;
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{LedgerConfig, QueryService, TransferEngine, TransferJournal};
pub use io::write_balances_csv;
pub use types::{
    Account, AppliedDelta, LedgerError, NodeId, Operation, TokenType, TokenTypeId,
    TransferPhase, TransferReceipt, TransferRequest, TransferSource,
};
