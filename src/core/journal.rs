//! Transfer journal
//!
//! Explicit persistence of in-flight transfer state, replacing checkpointed
//! protocol coroutines. Every transfer gets an entry at `begin`, records each
//! phase transition, and ends `Committed` (with its applied deltas — the
//! transaction log) or `Failed` (with the failure detail).
//!
//! Because no account delta becomes visible before the commit step completes,
//! a process restart can safely abort every non-terminal entry via
//! [`TransferJournal::recover`].

use crate::types::{AppliedDelta, LedgerError, TransferId, TransferPhase};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// One transfer's journal record
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub id: TransferId,
    /// One-line description of the requested route, e.g. `alice -> bob (30)`
    pub description: String,
    pub phase: TransferPhase,
    /// How many validation passes ran (1 plus the number of conflict retries)
    pub attempts: u32,
    /// Deltas applied at commit; empty unless `phase` is `Committed`
    pub deltas: Vec<AppliedDelta>,
    /// Failure detail; set only when `phase` is `Failed`
    pub failure: Option<String>,
}

/// Append-only journal of transfer attempts
#[derive(Debug, Default)]
pub struct TransferJournal {
    entries: DashMap<TransferId, JournalEntry>,
    next_id: AtomicU64,
}

impl TransferJournal {
    /// Create an empty journal
    pub fn new() -> Self {
        TransferJournal {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Open a new entry in the `Planning` phase and return its id
    pub fn begin(&self, description: String) -> TransferId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            id,
            JournalEntry {
                id,
                description,
                phase: TransferPhase::Planning,
                attempts: 0,
                deltas: Vec::new(),
                failure: None,
            },
        );
        id
    }

    /// Record a phase transition
    ///
    /// Entering `Validating` counts as a new attempt.
    pub fn transition(&self, id: TransferId, phase: TransferPhase) {
        if let Some(mut entry) = self.entries.get_mut(&id) {
            entry.phase = phase;
            if phase == TransferPhase::Validating {
                entry.attempts += 1;
            }
        }
    }

    /// Close an entry as `Committed`, recording its applied deltas
    pub fn committed(&self, id: TransferId, deltas: Vec<AppliedDelta>) {
        if let Some(mut entry) = self.entries.get_mut(&id) {
            entry.phase = TransferPhase::Committed;
            entry.deltas = deltas;
        }
    }

    /// Close an entry as `Failed`, recording the failure detail
    pub fn failed(&self, id: TransferId, error: &LedgerError) {
        if let Some(mut entry) = self.entries.get_mut(&id) {
            entry.phase = TransferPhase::Failed;
            entry.failure = Some(error.to_string());
        }
    }

    /// Snapshot of one entry
    pub fn entry(&self, id: TransferId) -> Option<JournalEntry> {
        self.entries.get(&id).map(|entry| entry.clone())
    }

    /// All committed entries, ordered by transfer id
    pub fn committed_entries(&self) -> Vec<JournalEntry> {
        let mut committed: Vec<JournalEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.phase == TransferPhase::Committed)
            .map(|entry| entry.clone())
            .collect();
        committed.sort_by_key(|entry| entry.id);
        committed
    }

    /// Ids of entries still in a non-terminal phase
    pub fn in_flight(&self) -> Vec<TransferId> {
        let mut ids: Vec<TransferId> = self
            .entries
            .iter()
            .filter(|entry| !entry.phase.is_terminal())
            .map(|entry| entry.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Abort every non-terminal entry, as run after a process restart
    ///
    /// Nothing was committed for these entries, so marking them `Failed` has
    /// no effect on balances. Returns the number of entries aborted.
    pub fn recover(&self) -> usize {
        let mut aborted = 0;
        for mut entry in self.entries.iter_mut() {
            if !entry.phase.is_terminal() {
                entry.phase = TransferPhase::Failed;
                entry.failure = Some("aborted during recovery".to_string());
                aborted += 1;
            }
        }
        aborted
    }
}
