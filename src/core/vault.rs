//! Node-level holdings vault
//!
//! Tracks fungible token quantities per (holder, issuer, token type). This is
//! the node-side balance that the account registry does not model: issuing
//! mints into it, redeeming burns from it, and the node-to-node leg of an
//! account transfer moves quantities between holders.
//!
//! The vault enforces its own sufficiency invariant; a shortfall surfaces as
//! `InsufficientHolding` here and is wrapped as `ExternalMoveFailed` when it
//! aborts a transfer.

use crate::core::traits::{NodeMove, NodeMover};
use crate::types::{LedgerError, NodeId, TokenTypeId};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, PoisonError};

/// Key of one holding bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HoldingKey {
    pub holder: NodeId,
    pub issuer: NodeId,
    pub token: TokenTypeId,
}

/// Thread-safe store of node-level token holdings
///
/// Reads are lock-free; mutations serialize on an internal gate so a
/// check-then-write (burn, transfer) cannot race another mutation into a
/// negative holding.
#[derive(Debug, Default)]
pub struct NodeVault {
    holdings: DashMap<HoldingKey, Decimal>,
    gate: Mutex<()>,
}

impl NodeVault {
    /// Create an empty vault
    pub fn new() -> Self {
        NodeVault {
            holdings: DashMap::new(),
            gate: Mutex::new(()),
        }
    }

    /// Mint `amount` of a token into a holder's bucket
    ///
    /// Returns the holder's new total for that (issuer, token) pair.
    pub fn issue(
        &self,
        holder: &NodeId,
        issuer: &NodeId,
        token: TokenTypeId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        let key = key(holder, issuer, token);
        let held = self.holdings.get(&key).map(|v| *v).unwrap_or(Decimal::ZERO);
        let total = held
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("issue", holder.as_str()))?;
        self.holdings.insert(key, total);
        Ok(total)
    }

    /// Burn `amount` of a token from a holder's bucket
    ///
    /// Returns the holder's remaining total.
    ///
    /// # Errors
    ///
    /// Fails with `InsufficientHolding` if the bucket cannot cover the amount;
    /// the bucket is left unchanged.
    pub fn burn(
        &self,
        holder: &NodeId,
        issuer: &NodeId,
        token: TokenTypeId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        let key = key(holder, issuer, token);
        let held = self.holdings.get(&key).map(|v| *v).unwrap_or(Decimal::ZERO);
        if held < amount {
            return Err(LedgerError::insufficient_holding(
                holder.as_str(),
                held,
                amount,
            ));
        }
        let remaining = held - amount;
        self.holdings.insert(key, remaining);
        Ok(remaining)
    }

    /// Move `amount` of a token from one holder to another
    ///
    /// A move between identical holders is a no-op. Debit and credit happen
    /// under one gate acquisition, so no reader can observe the quantity in
    /// flight as destroyed or duplicated.
    pub fn transfer(
        &self,
        from: &NodeId,
        to: &NodeId,
        issuer: &NodeId,
        token: TokenTypeId,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if from == to {
            return Ok(());
        }

        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        let from_key = key(from, issuer, token);
        let held = self
            .holdings
            .get(&from_key)
            .map(|v| *v)
            .unwrap_or(Decimal::ZERO);
        if held < amount {
            return Err(LedgerError::insufficient_holding(
                from.as_str(),
                held,
                amount,
            ));
        }

        let to_key = key(to, issuer, token);
        let received = self
            .holdings
            .get(&to_key)
            .map(|v| *v)
            .unwrap_or(Decimal::ZERO)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("transfer", to.as_str()))?;

        self.holdings.insert(from_key, held - amount);
        self.holdings.insert(to_key, received);
        Ok(())
    }

    /// Total quantity a holder has of one (issuer, token) pair
    pub fn total_held(&self, holder: &NodeId, issuer: &NodeId, token: TokenTypeId) -> Decimal {
        self.holdings
            .get(&key(holder, issuer, token))
            .map(|v| *v)
            .unwrap_or(Decimal::ZERO)
    }

    /// All of a holder's buckets as (token, issuer, quantity) triples
    pub fn holdings_of(&self, holder: &NodeId) -> Vec<(TokenTypeId, NodeId, Decimal)> {
        self.holdings
            .iter()
            .filter(|entry| &entry.key().holder == holder)
            .map(|entry| (entry.key().token, entry.key().issuer.clone(), *entry.value()))
            .collect()
    }
}

fn key(holder: &NodeId, issuer: &NodeId, token: TokenTypeId) -> HoldingKey {
    HoldingKey {
        holder: holder.clone(),
        issuer: issuer.clone(),
        token,
    }
}

/// Default [`NodeMover`] backed by the in-process vault
///
/// Transfer plans route their node-to-node leg through this mover; its
/// sufficiency failures abort the transfer as `ExternalMoveFailed`.
#[derive(Debug, Clone)]
pub struct VaultMover {
    vault: Arc<NodeVault>,
}

impl VaultMover {
    /// Create a mover over the shared vault
    pub fn new(vault: Arc<NodeVault>) -> Self {
        VaultMover { vault }
    }
}

impl NodeMover for VaultMover {
    fn move_tokens(&self, mv: &NodeMove) -> Result<(), LedgerError> {
        self.vault
            .transfer(&mv.from, &mv.to, &mv.issuer, mv.token, mv.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> NodeId {
        NodeId::new(name)
    }

    #[test]
    fn test_issue_accumulates() {
        let vault = NodeVault::new();
        let token = TokenTypeId::fresh();

        vault
            .issue(&node("PartyA"), &node("PartyA"), token, Decimal::new(10000, 2))
            .unwrap();
        let total = vault
            .issue(&node("PartyA"), &node("PartyA"), token, Decimal::new(5000, 2))
            .unwrap();

        assert_eq!(total, Decimal::new(15000, 2));
        assert_eq!(
            vault.total_held(&node("PartyA"), &node("PartyA"), token),
            Decimal::new(15000, 2)
        );
    }

    #[test]
    fn test_burn_requires_sufficient_holding() {
        let vault = NodeVault::new();
        let token = TokenTypeId::fresh();
        vault
            .issue(&node("PartyA"), &node("PartyA"), token, Decimal::new(5000, 2))
            .unwrap();

        let result = vault.burn(&node("PartyA"), &node("PartyA"), token, Decimal::new(10000, 2));

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientHolding { .. })
        ));
        // Holding unchanged
        assert_eq!(
            vault.total_held(&node("PartyA"), &node("PartyA"), token),
            Decimal::new(5000, 2)
        );
    }

    #[test]
    fn test_burn_reduces_holding() {
        let vault = NodeVault::new();
        let token = TokenTypeId::fresh();
        vault
            .issue(&node("PartyA"), &node("PartyA"), token, Decimal::new(10000, 2))
            .unwrap();

        let remaining = vault
            .burn(&node("PartyA"), &node("PartyA"), token, Decimal::new(4000, 2))
            .unwrap();

        assert_eq!(remaining, Decimal::new(6000, 2));
    }

    #[test]
    fn test_transfer_moves_between_holders() {
        let vault = NodeVault::new();
        let token = TokenTypeId::fresh();
        let issuer = node("PartyA");
        vault
            .issue(&node("PartyA"), &issuer, token, Decimal::new(10000, 2))
            .unwrap();

        vault
            .transfer(&node("PartyA"), &node("PartyB"), &issuer, token, Decimal::new(3000, 2))
            .unwrap();

        assert_eq!(
            vault.total_held(&node("PartyA"), &issuer, token),
            Decimal::new(7000, 2)
        );
        assert_eq!(
            vault.total_held(&node("PartyB"), &issuer, token),
            Decimal::new(3000, 2)
        );
    }

    #[test]
    fn test_transfer_to_self_is_noop() {
        let vault = NodeVault::new();
        let token = TokenTypeId::fresh();
        let issuer = node("PartyA");

        // No holdings at all, yet a self-move succeeds as a no-op
        vault
            .transfer(&node("PartyA"), &node("PartyA"), &issuer, token, Decimal::ONE)
            .unwrap();

        assert_eq!(
            vault.total_held(&node("PartyA"), &issuer, token),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_transfer_insufficient_leaves_both_sides_unchanged() {
        let vault = NodeVault::new();
        let token = TokenTypeId::fresh();
        let issuer = node("PartyA");
        vault
            .issue(&node("PartyA"), &issuer, token, Decimal::new(1000, 2))
            .unwrap();

        let result = vault.transfer(
            &node("PartyA"),
            &node("PartyB"),
            &issuer,
            token,
            Decimal::new(5000, 2),
        );

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientHolding { .. })
        ));
        assert_eq!(
            vault.total_held(&node("PartyA"), &issuer, token),
            Decimal::new(1000, 2)
        );
        assert_eq!(
            vault.total_held(&node("PartyB"), &issuer, token),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_holdings_of_filters_by_holder() {
        let vault = NodeVault::new();
        let token = TokenTypeId::fresh();
        let issuer = node("PartyA");
        vault
            .issue(&node("PartyA"), &issuer, token, Decimal::ONE)
            .unwrap();
        vault
            .issue(&node("PartyB"), &issuer, token, Decimal::TWO)
            .unwrap();

        let holdings = vault.holdings_of(&node("PartyB"));
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].2, Decimal::TWO);
    }

    #[test]
    fn test_vault_mover_routes_through_vault() {
        let vault = Arc::new(NodeVault::new());
        let token = TokenTypeId::fresh();
        let issuer = node("PartyA");
        vault
            .issue(&node("PartyA"), &issuer, token, Decimal::new(10000, 2))
            .unwrap();

        let mover = VaultMover::new(Arc::clone(&vault));
        mover
            .move_tokens(&NodeMove {
                from: node("PartyA"),
                to: node("PartyB"),
                issuer: issuer.clone(),
                token,
                amount: Decimal::new(2500, 2),
            })
            .unwrap();

        assert_eq!(
            vault.total_held(&node("PartyB"), &issuer, token),
            Decimal::new(2500, 2)
        );
    }

    #[test]
    fn test_concurrent_transfers_never_overdraw() {
        use std::thread;

        let vault = Arc::new(NodeVault::new());
        let token = TokenTypeId::fresh();
        let issuer = node("PartyA");
        vault
            .issue(&node("PartyA"), &issuer, token, Decimal::new(100, 0))
            .unwrap();

        // 10 threads each try to move 60 out of 100; at most one can succeed
        let mut handles = vec![];
        for i in 0..10 {
            let vault = Arc::clone(&vault);
            let issuer = issuer.clone();
            handles.push(thread::spawn(move || {
                vault
                    .transfer(
                        &NodeId::new("PartyA"),
                        &NodeId::new(format!("Party{}", i)),
                        &issuer,
                        token,
                        Decimal::new(60, 0),
                    )
                    .is_ok()
            }));
        }

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|succeeded| *succeeded)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(
            vault.total_held(&node("PartyA"), &issuer, token),
            Decimal::new(40, 0)
        );
    }
}
