//! Account-related types for the token ledger engine
//!
//! An account is a named balance record shared between two identified nodes.
//! Accounts are never mutated in place: every committed transfer produces a new
//! version of the record while the linear id stays stable, giving an
//! append-only versioned ledger.

use super::token::{NodeId, TokenTypeId};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Named balance record held jointly by two nodes
///
/// The `name` is the business key and must be unique across all live accounts.
/// `linear_id` identifies the record across versions: updates retire the prior
/// version under the same linear id rather than mutating it.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Unique business name of the account
    pub name: String,

    /// Node that recorded the account and tracks its token backing
    pub owner_node: NodeId,

    /// The other party to the account relationship
    pub counterparty_node: NodeId,

    /// Token type this account tracks; `None` until the account is first funded
    pub token_type: Option<TokenTypeId>,

    /// Current balance, denominated in the account's token type
    ///
    /// Invariant: never negative. Enforced by the balance ledger on every
    /// delta application.
    pub balance: Decimal,

    /// Stable identity across versions of this account record
    pub linear_id: Uuid,
}

impl Account {
    /// Create a new, unfunded account record
    ///
    /// The account starts with a zero balance and no token type; the first
    /// credit sets the token type.
    pub fn new(name: impl Into<String>, owner_node: NodeId, counterparty_node: NodeId) -> Self {
        Account {
            name: name.into(),
            owner_node,
            counterparty_node,
            token_type: None,
            balance: Decimal::ZERO,
            linear_id: Uuid::new_v4(),
        }
    }
}

/// One row of the final balance report written at the boundary
///
/// Carries the token type's business reference rather than its pointer id so
/// the report is stable and human-readable.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSummary {
    pub name: String,
    pub owner: String,
    pub counterparty: String,
    pub token: Option<String>,
    pub balance: Decimal,
}
