//! Balance ledger
//!
//! Applies a transfer plan's deltas as one atomic unit: either every delta is
//! recorded together with the node move, or nothing is. Readers never observe
//! a partial transfer.
//!
//! The commit path is optimistic. Validation reads versioned snapshots without
//! locks; `commit` then takes the commit gate, re-checks that every snapshot
//! version is still current, executes the node move, and applies the deltas.
//! A stale version aborts the commit before the move runs, so a conflicting
//! transfer is retried from validation without ever touching the mover.

use crate::core::journal::TransferJournal;
use crate::core::planner::TransferPlan;
use crate::core::registry::{AccountRegistry, AccountSnapshot, AccountUpdate};
use crate::core::traits::NodeMover;
use crate::core::validation::ResolvedTransfer;
use crate::types::{Account, AppliedDelta, LedgerError, TokenTypeId, TransferId, TransferPhase};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Why a commit attempt did not go through
#[derive(Debug)]
pub(crate) enum CommitFailure {
    /// A snapshot version was no longer current; retry from validation
    Stale,
    /// A real failure; the transfer is aborted with this error
    Fatal(LedgerError),
}

/// Applies debit/credit pairs atomically against the account registry
#[derive(Debug)]
pub struct BalanceLedger {
    registry: Arc<AccountRegistry>,
    journal: Arc<TransferJournal>,
    /// Serializes the check-move-apply section across transfers
    gate: Mutex<()>,
}

impl BalanceLedger {
    /// Create a ledger over the shared registry and journal
    pub fn new(registry: Arc<AccountRegistry>, journal: Arc<TransferJournal>) -> Self {
        BalanceLedger {
            registry,
            journal,
            gate: Mutex::new(()),
        }
    }

    /// Apply one signed delta to an account value
    ///
    /// Returns the new account value; the input is not modified. The first
    /// credit stamps the account with the transfer's token type.
    ///
    /// # Errors
    ///
    /// * `InsufficientBalance` - the delta would take the balance negative
    /// * `ArithmeticOverflow` - the balance arithmetic would overflow
    pub fn apply_delta(
        account: &Account,
        delta: Decimal,
        token: TokenTypeId,
    ) -> Result<Account, LedgerError> {
        let balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| LedgerError::arithmetic_overflow("apply_delta", &account.name))?;

        if balance.is_sign_negative() {
            return Err(LedgerError::insufficient_balance(
                &account.name,
                account.balance,
                delta.abs(),
            ));
        }

        Ok(Account {
            balance,
            token_type: account.token_type.or(Some(token)),
            ..account.clone()
        })
    }

    /// Commit a transfer plan: version check, node move, delta application
    ///
    /// Runs under the commit gate. Phase transitions are journaled as the
    /// commit progresses; on success the applied deltas are recorded as the
    /// transfer's transaction log entry.
    pub(crate) fn commit(
        &self,
        id: TransferId,
        plan: &TransferPlan,
        resolved: &ResolvedTransfer,
        mover: &dyn NodeMover,
    ) -> Result<Vec<AppliedDelta>, CommitFailure> {
        let _guard = self.gate.lock().unwrap_or_else(PoisonError::into_inner);

        // Optimistic check: every version read during validation must still
        // be current. Checked before the node move so a conflicting transfer
        // never triggers an external move it cannot commit.
        for snapshot in resolved.snapshots() {
            match self.registry.current_version(&snapshot.account.name) {
                Some(version) if version == snapshot.version => {}
                _ => return Err(CommitFailure::Stale),
            }
        }

        self.journal
            .transition(id, TransferPhase::AwaitingExternalMove);
        if let Some(node_move) = &plan.node_move {
            mover.move_tokens(node_move).map_err(|error| match error {
                already @ LedgerError::ExternalMoveFailed { .. } => {
                    CommitFailure::Fatal(already)
                }
                other => {
                    CommitFailure::Fatal(LedgerError::external_move_failed(other.to_string()))
                }
            })?;
        }

        self.journal.transition(id, TransferPhase::Committing);

        // Fold the deltas over working copies so a self-transfer sees its own
        // credit before the debit.
        let mut working: HashMap<String, AccountSnapshot> = resolved
            .snapshots()
            .into_iter()
            .map(|snapshot| (snapshot.account.name.clone(), snapshot.clone()))
            .collect();

        let mut applied = Vec::with_capacity(plan.deltas.len());
        for delta in &plan.deltas {
            let snapshot = working.get_mut(&delta.account).ok_or_else(|| {
                CommitFailure::Fatal(LedgerError::account_not_found(&delta.account))
            })?;
            let updated = Self::apply_delta(&snapshot.account, delta.amount, plan.token)
                .map_err(CommitFailure::Fatal)?;
            applied.push(AppliedDelta {
                account: delta.account.clone(),
                amount: delta.amount,
                resulting_balance: updated.balance,
            });
            snapshot.account = updated;
        }

        let updates: Vec<AccountUpdate> = working
            .into_values()
            .map(|snapshot| AccountUpdate {
                account: snapshot.account,
                expected_version: snapshot.version,
            })
            .collect();

        self.registry
            .apply(&updates)
            .map_err(|_| CommitFailure::Stale)?;

        self.journal.committed(id, applied.clone());
        Ok(applied)
    }
}
