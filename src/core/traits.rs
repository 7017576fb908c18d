//! Core trait abstractions
//!
//! Two seams are expressed as traits:
//!
//! - [`AccountRepository`] is the explicit lookup surface over live accounts,
//!   replacing any implicit query engine. The validation layer only ever sees
//!   this trait, so alternative storage backends can be swapped in.
//! - [`NodeMover`] is the external collaborator that executes the
//!   node-to-node leg of a transfer. The default implementation is backed by
//!   the in-process vault; tests substitute failing movers.

use crate::core::registry::AccountSnapshot;
use crate::types::{LedgerError, NodeId, TokenTypeId};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Read-only lookup surface over live accounts
///
/// Snapshots carry the version observed at read time; committers use it for
/// the optimistic check at commit time.
pub trait AccountRepository {
    /// Look up one live account by its unique name
    fn find_by_name(&self, name: &str) -> Option<AccountSnapshot>;

    /// Look up several accounts at once; partial results are allowed
    ///
    /// Callers must verify completeness themselves: a result set smaller than
    /// the request set means at least one name does not resolve.
    fn find_many(&self, names: &[&str]) -> HashMap<String, AccountSnapshot>;
}

/// The node-to-node token move a transfer plan may carry
///
/// Planned only when source and destination accounts live on different nodes;
/// same-node transfers never produce one.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMove {
    pub from: NodeId,
    pub to: NodeId,
    pub issuer: NodeId,
    pub token: TokenTypeId,
    pub amount: Decimal,
}

/// External collaborator executing node-to-node token moves
///
/// A failure or timeout aborts the whole transfer before any account delta is
/// applied and surfaces as `ExternalMoveFailed`; the engine never retries a
/// move automatically.
pub trait NodeMover: Send + Sync {
    /// Execute one node-to-node move, atomically on the mover's side
    fn move_tokens(&self, mv: &NodeMove) -> Result<(), LedgerError>;
}
