//! Operation and transfer types
//!
//! This module defines the typed operations the engine accepts from the
//! boundary, the transfer request that drives one planner invocation, and the
//! phase/delta types the transfer journal records.

use super::token::NodeId;
use rust_decimal::Decimal;
use std::fmt;

/// Sentinel account name meaning "the node's own, untracked balance"
///
/// A transfer sourced from the sentinel credits the destination account
/// without debiting any tracked account; the node-side balance is an external
/// resource with its own invariant.
pub const NODE_SENTINEL: &str = "NODE";

/// Monotonically increasing identifier of one transfer attempt in the journal
pub type TransferId = u64;

/// A typed ledger operation, converted from one boundary (CSV) row
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Register a new named account
    CreateAccount {
        name: String,
        counterparty: NodeId,
        /// Optional opening balance; minted into the vault and credited to
        /// the account in one step
        opening_balance: Option<Decimal>,
    },

    /// Mint node-level holdings for a holder (the local node when unset)
    Issue {
        holder: Option<NodeId>,
        amount: Decimal,
    },

    /// Move balance between accounts, or from the node sentinel to an account
    ///
    /// This is the core operation; everything else is supporting machinery.
    Transfer(TransferRequest),

    /// Move node-level holdings from the local node to another node
    NodeTransfer { new_holder: NodeId, amount: Decimal },

    /// Burn node-level holdings of the local node
    Redeem { amount: Decimal },
}

/// Where a transfer's amount comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferSource {
    /// The untracked node-level balance (the `NODE` sentinel)
    Node,
    /// A named, tracked account
    Account(String),
}

impl TransferSource {
    /// Classify a raw source name: empty or the sentinel means the node
    pub fn from_name(name: &str) -> Self {
        if name.is_empty() || name == NODE_SENTINEL {
            TransferSource::Node
        } else {
            TransferSource::Account(name.to_string())
        }
    }

    /// The account name when the source is a tracked account
    pub fn account_name(&self) -> Option<&str> {
        match self {
            TransferSource::Node => None,
            TransferSource::Account(name) => Some(name),
        }
    }
}

impl fmt::Display for TransferSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferSource::Node => f.write_str(NODE_SENTINEL),
            TransferSource::Account(name) => f.write_str(name),
        }
    }
}

/// Ephemeral request driving one transfer; discarded after the attempt
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub source: TransferSource,
    pub to: String,
    pub amount: Decimal,
}

impl TransferRequest {
    /// One-line description used in the transfer journal
    pub fn describe(&self) -> String {
        format!("{} -> {} ({})", self.source, self.to, self.amount)
    }
}

/// Phase of one transfer's explicit state machine
///
/// Replaces suspendable-protocol checkpointing: every transition is journaled,
/// so a restarted process can enumerate in-flight transfers. Nothing becomes
/// visible before `Committing` completes, so aborting a non-terminal transfer
/// is always safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    Planning,
    Validating,
    AwaitingExternalMove,
    Committing,
    Committed,
    Failed,
}

impl TransferPhase {
    /// Whether the transfer has reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferPhase::Committed | TransferPhase::Failed)
    }
}

/// One planned balance change; negative amounts are debits
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceDelta {
    pub account: String,
    pub amount: Decimal,
}

/// One balance change that was actually committed
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDelta {
    pub account: String,
    pub amount: Decimal,
    pub resulting_balance: Decimal,
}

/// Outcome of a committed transfer: its journal id plus the applied deltas
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub transfer_id: TransferId,
    pub deltas: Vec<AppliedDelta>,
}
