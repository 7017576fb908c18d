//! Query service
//!
//! Read-only lookups over node-level holdings, used by the boundary ("what
//! does this party currently hold") and by the node-level sufficiency checks.

use crate::core::token_registry::TokenTypeRegistry;
use crate::core::vault::NodeVault;
use crate::types::{NodeId, TokenTypeId};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

/// One holder's position in one (token type, issuer) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingSummary {
    /// Business reference of the token type; the raw pointer id when the
    /// definition is no longer registered
    pub token_type: String,
    pub issuer: NodeId,
    pub total: Decimal,
}

/// Read-only view over the vault and token type registry
#[derive(Debug, Clone)]
pub struct QueryService {
    vault: Arc<NodeVault>,
    tokens: Arc<TokenTypeRegistry>,
}

impl QueryService {
    /// Create a query service over the shared stores
    pub fn new(vault: Arc<NodeVault>, tokens: Arc<TokenTypeRegistry>) -> Self {
        QueryService { vault, tokens }
    }

    /// All of a holder's positions, grouped by (token type, issuer) with
    /// quantities summed
    ///
    /// Results are sorted by token reference then issuer, so repeated calls
    /// with no intervening writes return identical sequences.
    pub fn list_balances_by_holder(&self, holder: &NodeId) -> Vec<HoldingSummary> {
        let mut summaries: Vec<HoldingSummary> = self
            .vault
            .holdings_of(holder)
            .into_iter()
            .map(|(token, issuer, total)| HoldingSummary {
                token_type: self
                    .tokens
                    .get(token)
                    .map(|definition| definition.reference)
                    .unwrap_or_else(|| token.to_string()),
                issuer,
                total,
            })
            .collect();
        summaries.sort_by(|a, b| {
            (a.token_type.as_str(), a.issuer.as_str())
                .cmp(&(b.token_type.as_str(), b.issuer.as_str()))
        });
        summaries
    }

    /// Total quantity a holder has of one token from one issuer
    pub fn total_held(&self, holder: &NodeId, issuer: &NodeId, token: TokenTypeId) -> Decimal {
        self.vault.total_held(holder, issuer, token)
    }
}
