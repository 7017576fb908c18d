//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: versioned account records and balance report rows
//! - `token`: token type definitions and node identities
//! - `operation`: boundary operations, transfer requests, phases and deltas
//! - `error`: error types for the ledger engine

pub mod account;
pub mod error;
pub mod operation;
pub mod token;

pub use account::{Account, BalanceSummary};
pub use error::LedgerError;
pub use operation::{
    AppliedDelta, BalanceDelta, Operation, TransferId, TransferPhase, TransferReceipt,
    TransferRequest, TransferSource, NODE_SENTINEL,
};
pub use token::{NodeId, TokenType, TokenTypeId};
