//! Transfer engine
//!
//! Orchestrates the full operation set over the shared registries: account
//! creation, node-level issue/move/redeem, and the core account transfer with
//! its explicit state machine and optimistic commit.
//!
//! The engine is cheap to clone (all state is behind `Arc`) and safe to drive
//! from many threads at once: transfers touching disjoint accounts proceed in
//! parallel, transfers sharing an account serialize through the version check
//! and are retried from validation on conflict.

use crate::core::journal::TransferJournal;
use crate::core::ledger::{BalanceLedger, CommitFailure};
use crate::core::planner::plan_transfer;
use crate::core::query::QueryService;
use crate::core::registry::AccountRegistry;
use crate::core::token_registry::TokenTypeRegistry;
use crate::core::traits::NodeMover;
use crate::core::validation::{validate_opening_balance, validate_transfer};
use crate::core::vault::{NodeVault, VaultMover};
use crate::types::{
    Account, BalanceSummary, LedgerError, NodeId, Operation, TokenType, TokenTypeId,
    TransferPhase, TransferReceipt, TransferRequest, NODE_SENTINEL,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

/// How many times a conflicted transfer is re-validated before surfacing
/// `Conflict` to the caller
pub const MAX_CONFLICT_RETRIES: u32 = 3;

/// Static configuration of one engine instance
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// The node this engine operates on behalf of
    pub local_node: NodeId,
    /// The node all token issuance is attributed to
    pub issuer_node: NodeId,
    /// Business reference of the ledger's unit token type
    pub token_reference: String,
    /// Decimal places the unit token is quoted in
    pub fraction_digits: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            local_node: NodeId::new("PartyA"),
            issuer_node: NodeId::new("PartyA"),
            token_reference: "DVT".to_string(),
            fraction_digits: 2,
        }
    }
}

/// Orchestrator over the account registry, token registry, vault, journal and
/// balance ledger
#[derive(Clone)]
pub struct TransferEngine {
    config: LedgerConfig,
    registry: Arc<AccountRegistry>,
    tokens: Arc<TokenTypeRegistry>,
    vault: Arc<NodeVault>,
    journal: Arc<TransferJournal>,
    ledger: Arc<BalanceLedger>,
    mover: Arc<dyn NodeMover>,
    unit_token: TokenTypeId,
}

impl TransferEngine {
    /// Create an engine with the default vault-backed node mover
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        Self::build(config, None)
    }

    /// Create an engine with a custom node mover
    ///
    /// Used by tests and by deployments where the node-to-node move is a real
    /// remote collaborator rather than the in-process vault.
    pub fn with_mover(
        config: LedgerConfig,
        mover: Arc<dyn NodeMover>,
    ) -> Result<Self, LedgerError> {
        Self::build(config, Some(mover))
    }

    fn build(
        config: LedgerConfig,
        mover: Option<Arc<dyn NodeMover>>,
    ) -> Result<Self, LedgerError> {
        let registry = Arc::new(AccountRegistry::new());
        let tokens = Arc::new(TokenTypeRegistry::new());
        let vault = Arc::new(NodeVault::new());
        let journal = Arc::new(TransferJournal::new());
        let ledger = Arc::new(BalanceLedger::new(
            Arc::clone(&registry),
            Arc::clone(&journal),
        ));
        let mover = mover.unwrap_or_else(|| Arc::new(VaultMover::new(Arc::clone(&vault))));

        // Register the ledger's unit token type up front; every account and
        // holding is denominated in it.
        let mut maintainers = vec![config.local_node.clone()];
        if config.issuer_node != config.local_node {
            maintainers.push(config.issuer_node.clone());
        }
        let unit_token = tokens.create(TokenType::new(
            config.token_reference.clone(),
            None,
            config.fraction_digits,
            maintainers,
        ))?;

        Ok(TransferEngine {
            config,
            registry,
            tokens,
            vault,
            journal,
            ledger,
            mover,
            unit_token,
        })
    }

    /// The engine's configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Pointer id of the ledger's unit token type
    pub fn unit_token(&self) -> TokenTypeId {
        self.unit_token
    }

    /// The transfer journal (phase transitions and applied deltas)
    pub fn journal(&self) -> &TransferJournal {
        &self.journal
    }

    /// The token type registry, for evolvable-definition maintenance
    pub fn token_types(&self) -> &TokenTypeRegistry {
        &self.tokens
    }

    /// Read-only query service over holdings
    pub fn query(&self) -> QueryService {
        QueryService::new(Arc::clone(&self.vault), Arc::clone(&self.tokens))
    }

    /// Abort every transfer left in a non-terminal phase
    ///
    /// Run after a process restart; returns how many entries were aborted.
    /// Safe because nothing is visible for a transfer that never finished
    /// committing.
    pub fn recover(&self) -> usize {
        let aborted = self.journal.recover();
        if aborted > 0 {
            info!(aborted, "aborted in-flight transfers during recovery");
        }
        aborted
    }

    /// Register a new named account owned by the local node
    ///
    /// An opening balance is minted into the vault and credited to the account
    /// in the same step, stamping it with the unit token type.
    ///
    /// # Errors
    ///
    /// * `DuplicateName` - the name is taken by a live account, or is the
    ///   reserved node sentinel
    /// * `InvalidAmount` - the opening balance is negative
    pub fn create_account(
        &self,
        name: &str,
        counterparty: NodeId,
        opening_balance: Option<Decimal>,
    ) -> Result<Account, LedgerError> {
        if name == NODE_SENTINEL {
            // The sentinel is permanently taken
            return Err(LedgerError::duplicate_name(name));
        }

        let mut account = Account::new(name, self.config.local_node.clone(), counterparty);
        if let Some(amount) = validate_opening_balance(opening_balance)? {
            self.vault.issue(
                &self.config.local_node,
                &self.config.issuer_node,
                self.unit_token,
                amount,
            )?;
            account.balance = amount;
            account.token_type = Some(self.unit_token);
        }

        let snapshot = self.registry.create(account)?;
        info!(name, balance = %snapshot.account.balance, "account created");
        Ok(snapshot.account)
    }

    /// Mint node-level holdings for a holder (the local node when unset)
    ///
    /// Returns the holder's new total.
    pub fn issue(
        &self,
        holder: Option<NodeId>,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(amount));
        }
        let holder = holder.unwrap_or_else(|| self.config.local_node.clone());
        let total = self
            .vault
            .issue(&holder, &self.config.issuer_node, self.unit_token, amount)?;
        info!(%holder, %amount, %total, "issued node-level holdings");
        Ok(total)
    }

    /// Move node-level holdings from the local node to another node
    ///
    /// The local holding must cover the amount; a move to the local node
    /// itself is a no-op.
    pub fn node_transfer(&self, new_holder: NodeId, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(amount));
        }
        let held = self.vault.total_held(
            &self.config.local_node,
            &self.config.issuer_node,
            self.unit_token,
        );
        if held < amount {
            return Err(LedgerError::insufficient_holding(
                self.config.local_node.as_str(),
                held,
                amount,
            ));
        }
        self.vault.transfer(
            &self.config.local_node,
            &new_holder,
            &self.config.issuer_node,
            self.unit_token,
            amount,
        )?;
        info!(%new_holder, %amount, "moved node-level holdings");
        Ok(())
    }

    /// Burn node-level holdings of the local node
    ///
    /// Returns the remaining total.
    pub fn redeem(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(amount));
        }
        let remaining = self.vault.burn(
            &self.config.local_node,
            &self.config.issuer_node,
            self.unit_token,
            amount,
        )?;
        info!(%amount, %remaining, "redeemed node-level holdings");
        Ok(remaining)
    }

    /// Execute one balance transfer atomically
    ///
    /// Runs the explicit state machine: plan, validate, external move, commit.
    /// A commit-time version conflict re-runs validation against fresh
    /// snapshots up to [`MAX_CONFLICT_RETRIES`] times before surfacing
    /// `Conflict`. Any failure leaves every balance untouched.
    pub fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, LedgerError> {
        let id = self.journal.begin(request.describe());
        let result = self.run_transfer(id, &request);
        match &result {
            Ok(receipt) => {
                info!(
                    transfer_id = id,
                    deltas = receipt.deltas.len(),
                    "transfer committed"
                );
            }
            Err(error) => {
                self.journal.failed(id, error);
                debug!(transfer_id = id, %error, "transfer failed");
            }
        }
        result
    }

    fn run_transfer(
        &self,
        id: u64,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, LedgerError> {
        self.journal.transition(id, TransferPhase::Planning);

        let mut attempts = 0;
        loop {
            attempts += 1;
            self.journal.transition(id, TransferPhase::Validating);
            let resolved = validate_transfer(request, self.registry.as_ref())?;
            let plan = plan_transfer(
                request,
                &resolved,
                &self.config.local_node,
                &self.config.issuer_node,
                self.unit_token,
            );

            match self
                .ledger
                .commit(id, &plan, &resolved, self.mover.as_ref())
            {
                Ok(deltas) => {
                    return Ok(TransferReceipt {
                        transfer_id: id,
                        deltas,
                    })
                }
                Err(CommitFailure::Stale) if attempts <= MAX_CONFLICT_RETRIES => {
                    debug!(transfer_id = id, attempts, "commit conflict, revalidating");
                }
                Err(CommitFailure::Stale) => return Err(LedgerError::conflict(attempts)),
                Err(CommitFailure::Fatal(error)) => return Err(error),
            }
        }
    }

    /// Route one typed boundary operation to its handler
    pub fn apply_operation(&self, operation: &Operation) -> Result<(), LedgerError> {
        match operation {
            Operation::CreateAccount {
                name,
                counterparty,
                opening_balance,
            } => {
                self.create_account(name, counterparty.clone(), *opening_balance)?;
            }
            Operation::Issue { holder, amount } => {
                self.issue(holder.clone(), *amount)?;
            }
            Operation::Transfer(request) => {
                self.transfer(request.clone())?;
            }
            Operation::NodeTransfer { new_holder, amount } => {
                self.node_transfer(new_holder.clone(), *amount)?;
            }
            Operation::Redeem { amount } => {
                self.redeem(*amount)?;
            }
        }
        Ok(())
    }

    /// All live accounts, sorted by name
    pub fn accounts(&self) -> Vec<Account> {
        self.registry.all()
    }

    #[cfg(test)]
    pub(crate) fn registry_handle(&self) -> Arc<AccountRegistry> {
        Arc::clone(&self.registry)
    }

    /// Final balance report rows, with token pointers resolved to references
    pub fn balance_summaries(&self) -> Vec<BalanceSummary> {
        self.registry
            .all()
            .into_iter()
            .map(|account| BalanceSummary {
                name: account.name,
                owner: account.owner_node.to_string(),
                counterparty: account.counterparty_node.to_string(),
                token: account
                    .token_type
                    .map(|id| {
                        self.tokens
                            .get(id)
                            .map(|definition| definition.reference)
                            .unwrap_or_else(|| id.to_string())
                    }),
                balance: account.balance,
            })
            .collect()
    }
}
