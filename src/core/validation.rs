//! Validation layer
//!
//! Pre-flight checks run once per transfer attempt, before any mutation is
//! planned. Validation is a precondition gate, not a rollback mechanism: every
//! failure here is raised while the ledger is still untouched, so no
//! compensation is ever needed.
//!
//! On a commit-time version conflict the whole validation pass re-runs against
//! fresh snapshots, which is how a losing concurrent transfer surfaces
//! `InsufficientBalance` instead of silently overdrawing.

use crate::core::registry::AccountSnapshot;
use crate::core::traits::AccountRepository;
use crate::types::{LedgerError, TransferRequest, TransferSource, NODE_SENTINEL};
use rust_decimal::Decimal;

/// Account snapshots a validated transfer will read-then-write
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTransfer {
    pub destination: AccountSnapshot,
    /// `None` when the transfer is sourced from the node sentinel
    pub source: Option<AccountSnapshot>,
}

impl ResolvedTransfer {
    /// Every snapshot whose version must still be current at commit time
    pub fn snapshots(&self) -> Vec<&AccountSnapshot> {
        let mut snapshots = vec![&self.destination];
        if let Some(source) = &self.source {
            // A self-transfer reads one record, not two
            if source.account.name != self.destination.account.name {
                snapshots.push(source);
            }
        }
        snapshots
    }
}

/// Run all pre-flight checks for a transfer and resolve its accounts
///
/// Checks, in order:
/// 1. the amount is strictly positive (`InvalidAmount`)
/// 2. the destination names a ledger account, not the sentinel or nothing
///    (`InvalidDestination`)
/// 3. every named account resolves to exactly one live record; a missing
///    destination is `InvalidDestination`, a missing source is
///    `AccountNotFound`
/// 4. a named source covers the amount (`InsufficientBalance`); skipped for
///    the node sentinel, whose balance is an external resource checked by the
///    node mover
pub fn validate_transfer(
    request: &TransferRequest,
    repository: &dyn AccountRepository,
) -> Result<ResolvedTransfer, LedgerError> {
    if request.amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(request.amount));
    }

    if request.to.is_empty() || request.to == NODE_SENTINEL {
        return Err(LedgerError::invalid_destination(
            &request.to,
            "destination must name a ledger account",
        ));
    }

    // Resolve all involved names in one lookup; a short result set means at
    // least one account does not exist.
    let mut names: Vec<&str> = vec![request.to.as_str()];
    if let Some(source_name) = request.source.account_name() {
        if source_name != request.to {
            names.push(source_name);
        }
    }
    let mut found = repository.find_many(&names);

    let destination = found.remove(&request.to).ok_or_else(|| {
        LedgerError::invalid_destination(&request.to, "no live account with this name")
    })?;

    let source = match &request.source {
        TransferSource::Node => None,
        TransferSource::Account(name) => {
            let snapshot = if name == &request.to {
                destination.clone()
            } else {
                found
                    .remove(name.as_str())
                    .ok_or_else(|| LedgerError::account_not_found(name))?
            };
            if snapshot.account.balance < request.amount {
                return Err(LedgerError::insufficient_balance(
                    name,
                    snapshot.account.balance,
                    request.amount,
                ));
            }
            Some(snapshot)
        }
    };

    Ok(ResolvedTransfer {
        destination,
        source,
    })
}

/// Check an opening balance before account creation
///
/// `None` and zero mean "create unfunded"; a negative opening balance is
/// rejected before the registry is touched.
pub fn validate_opening_balance(amount: Option<Decimal>) -> Result<Option<Decimal>, LedgerError> {
    match amount {
        Some(amount) if amount.is_sign_negative() => Err(LedgerError::invalid_amount(amount)),
        Some(amount) if amount.is_zero() => Ok(None),
        other => Ok(other),
    }
}
