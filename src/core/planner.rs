//! Transfer planner
//!
//! Turns a validated transfer request into the ordered list of balance deltas
//! plus the optional node-to-node token move required to realize it.
//!
//! Decision table:
//!
//! | source          | plan                                                        |
//! |-----------------|-------------------------------------------------------------|
//! | node sentinel   | move tokens local node -> destination's owner; credit dest  |
//! | named account   | move tokens source's owner -> destination's owner; credit   |
//! |                 | dest; debit the source's own record                         |
//!
//! The node move is planned only when the two nodes differ. Deltas are ordered
//! credit-first; a failure between the two is impossible because the ledger
//! applies the whole list as one atomic unit.

use crate::core::traits::NodeMove;
use crate::core::validation::ResolvedTransfer;
use crate::types::{BalanceDelta, NodeId, TokenTypeId, TransferRequest, TransferSource};

/// The full set of changes one transfer will commit atomically
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPlan {
    /// Token type all deltas of this transfer are denominated in
    pub token: TokenTypeId,
    /// Node-to-node leg; `None` when both sides live on the same node
    pub node_move: Option<NodeMove>,
    /// Balance deltas in application order: credit destination, then debit
    /// source
    pub deltas: Vec<BalanceDelta>,
}

/// Build the plan for a validated transfer
pub fn plan_transfer(
    request: &TransferRequest,
    resolved: &ResolvedTransfer,
    local_node: &NodeId,
    issuer_node: &NodeId,
    token: TokenTypeId,
) -> TransferPlan {
    let destination = &resolved.destination.account;

    // The node the amount leaves from: the local node for sentinel-sourced
    // transfers, otherwise the source account's own owner.
    let origin_node = match &resolved.source {
        None => local_node.clone(),
        Some(source) => source.account.owner_node.clone(),
    };

    let node_move = if origin_node != destination.owner_node {
        Some(NodeMove {
            from: origin_node,
            to: destination.owner_node.clone(),
            issuer: issuer_node.clone(),
            token,
            amount: request.amount,
        })
    } else {
        None
    };

    let mut deltas = vec![BalanceDelta {
        account: destination.name.clone(),
        amount: request.amount,
    }];
    if let TransferSource::Account(name) = &request.source {
        deltas.push(BalanceDelta {
            account: name.clone(),
            amount: -request.amount,
        });
    }

    TransferPlan {
        token,
        node_move,
        deltas,
    }
}
