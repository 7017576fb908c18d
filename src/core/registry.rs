//! Account registry
//!
//! Thread-safe table of live accounts keyed by their unique name. Each entry
//! carries a version counter used for optimistic concurrency: readers take
//! snapshots, committers apply updates only if every version they read is
//! still current.
//!
//! Registering a new version of an account retires the prior one under the
//! same linear id; the registry only ever exposes the latest (live) version.

use crate::core::traits::AccountRepository;
use crate::types::{Account, LedgerError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;

/// A live account together with the version observed at read time
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub account: Account,
    pub version: u64,
}

/// A new account value to be applied if the expected version is still current
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    pub account: Account,
    pub expected_version: u64,
}

/// Returned when an update's expected version is no longer current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleVersion;

#[derive(Debug, Clone)]
struct VersionedAccount {
    account: Account,
    version: u64,
}

/// Thread-safe registry of live accounts keyed by name
///
/// Reads are lock-free snapshots. `apply` performs the optimistic
/// check-then-write and is only called while the balance ledger's commit gate
/// is held, so the check and the write cannot interleave with another commit.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: DashMap<String, VersionedAccount>,
}

impl AccountRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        AccountRegistry {
            accounts: DashMap::new(),
        }
    }

    /// Register a new account
    ///
    /// Fails with `DuplicateName` if a live account with the same name already
    /// exists. The new entry starts at version 1.
    pub fn create(&self, account: Account) -> Result<AccountSnapshot, LedgerError> {
        match self.accounts.entry(account.name.clone()) {
            Entry::Occupied(_) => Err(LedgerError::duplicate_name(&account.name)),
            Entry::Vacant(entry) => {
                entry.insert(VersionedAccount {
                    account: account.clone(),
                    version: 1,
                });
                Ok(AccountSnapshot {
                    account,
                    version: 1,
                })
            }
        }
    }

    /// Current version of an account, if it exists
    pub fn current_version(&self, name: &str) -> Option<u64> {
        self.accounts.get(name).map(|entry| entry.version)
    }

    /// Apply a batch of updates, each gated on its expected version
    ///
    /// All versions are verified before any write, so a stale batch leaves the
    /// registry untouched. Callers must hold the commit gate; without it the
    /// verify and write steps could interleave with another committer.
    pub fn apply(&self, updates: &[AccountUpdate]) -> Result<(), StaleVersion> {
        for update in updates {
            match self.accounts.get(&update.account.name) {
                Some(entry) if entry.version == update.expected_version => {}
                _ => return Err(StaleVersion),
            }
        }

        for update in updates {
            if let Some(mut entry) = self.accounts.get_mut(&update.account.name) {
                entry.account = update.account.clone();
                entry.version += 1;
            }
        }

        Ok(())
    }

    /// All live accounts, sorted by name for deterministic output
    pub fn all(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.account.clone())
            .collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        accounts
    }

    /// Number of live accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the registry holds no accounts
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountRepository for AccountRegistry {
    fn find_by_name(&self, name: &str) -> Option<AccountSnapshot> {
        self.accounts.get(name).map(|entry| AccountSnapshot {
            account: entry.account.clone(),
            version: entry.version,
        })
    }

    fn find_many(&self, names: &[&str]) -> HashMap<String, AccountSnapshot> {
        let mut found = HashMap::new();
        for name in names {
            if let Some(snapshot) = self.find_by_name(name) {
                found.insert(snapshot.account.name.clone(), snapshot);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;
    use rust_decimal::Decimal;

    fn account(name: &str) -> Account {
        Account::new(name, NodeId::new("PartyA"), NodeId::new("PartyB"))
    }

    #[test]
    fn test_create_registers_at_version_one() {
        let registry = AccountRegistry::new();

        let snapshot = registry.create(account("alice")).unwrap();

        assert_eq!(snapshot.version, 1);
        assert_eq!(registry.current_version("alice"), Some(1));
    }

    #[test]
    fn test_create_rejects_duplicate_name() {
        let registry = AccountRegistry::new();
        registry.create(account("alice")).unwrap();

        let result = registry.create(account("alice"));

        assert_eq!(result, Err(LedgerError::duplicate_name("alice")));
        // Registry unchanged
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.current_version("alice"), Some(1));
    }

    #[test]
    fn test_find_by_name_returns_none_for_missing_account() {
        let registry = AccountRegistry::new();
        assert!(registry.find_by_name("ghost").is_none());
    }

    #[test]
    fn test_find_many_returns_partial_results() {
        let registry = AccountRegistry::new();
        registry.create(account("alice")).unwrap();
        registry.create(account("bob")).unwrap();

        let found = registry.find_many(&["alice", "ghost", "bob"]);

        assert_eq!(found.len(), 2);
        assert!(found.contains_key("alice"));
        assert!(found.contains_key("bob"));
        assert!(!found.contains_key("ghost"));
    }

    #[test]
    fn test_apply_bumps_version_and_keeps_linear_id() {
        let registry = AccountRegistry::new();
        let snapshot = registry.create(account("alice")).unwrap();

        let mut updated = snapshot.account.clone();
        updated.balance = Decimal::new(10000, 2);
        registry
            .apply(&[AccountUpdate {
                account: updated,
                expected_version: snapshot.version,
            }])
            .unwrap();

        let current = registry.find_by_name("alice").unwrap();
        assert_eq!(current.version, 2);
        assert_eq!(current.account.balance, Decimal::new(10000, 2));
        assert_eq!(current.account.linear_id, snapshot.account.linear_id);
    }

    #[test]
    fn test_apply_rejects_stale_version() {
        let registry = AccountRegistry::new();
        let snapshot = registry.create(account("alice")).unwrap();

        // First update succeeds and bumps the version
        registry
            .apply(&[AccountUpdate {
                account: snapshot.account.clone(),
                expected_version: 1,
            }])
            .unwrap();

        // Second update against the stale version is rejected
        let result = registry.apply(&[AccountUpdate {
            account: snapshot.account.clone(),
            expected_version: 1,
        }]);

        assert_eq!(result, Err(StaleVersion));
        assert_eq!(registry.current_version("alice"), Some(2));
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let registry = AccountRegistry::new();
        let alice = registry.create(account("alice")).unwrap();
        let bob = registry.create(account("bob")).unwrap();

        // Second update in the batch is stale, so neither is applied
        let result = registry.apply(&[
            AccountUpdate {
                account: alice.account.clone(),
                expected_version: alice.version,
            },
            AccountUpdate {
                account: bob.account.clone(),
                expected_version: bob.version + 1,
            },
        ]);

        assert_eq!(result, Err(StaleVersion));
        assert_eq!(registry.current_version("alice"), Some(1));
        assert_eq!(registry.current_version("bob"), Some(1));
    }

    #[test]
    fn test_all_is_sorted_by_name() {
        let registry = AccountRegistry::new();
        registry.create(account("carol")).unwrap();
        registry.create(account("alice")).unwrap();
        registry.create(account("bob")).unwrap();

        let names: Vec<String> = registry.all().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }
}
