//! Token type and node identity definitions
//!
//! A token type is the evolvable definition of the fungible unit that accounts
//! track. Later versions replace earlier ones while the stable pointer id stays
//! unchanged, so accounts can reference a token type without caring which
//! version is current.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Canonical identity of a participating node
///
/// Node identities are opaque names resolved by an external identity service;
/// the engine only compares and displays them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node identity from its canonical name
    pub fn new(name: impl Into<String>) -> Self {
        NodeId(name.into())
    }

    /// The canonical name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        NodeId::new(name)
    }
}

/// Stable pointer to a token type, independent of its version
///
/// The id is minted once when the token type is first registered and carried
/// unchanged across all later versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenTypeId(Uuid);

impl TokenTypeId {
    /// Mint a fresh pointer id
    pub fn fresh() -> Self {
        TokenTypeId(Uuid::new_v4())
    }
}

impl fmt::Display for TokenTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Evolvable definition of a fungible unit of value
///
/// The `reference` is the business identifier and must never change across
/// versions. `valuation` is optional: reference-only token types (pure units
/// of account) carry no valuation.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenType {
    /// Business identifier, stable across versions
    pub reference: String,

    /// Optional valuation; must be strictly positive when present
    pub valuation: Option<Decimal>,

    /// When this definition was issued; must not lie in the future
    pub issued_at: DateTime<Utc>,

    /// Number of decimal places amounts of this token are quoted in
    pub fraction_digits: u32,

    /// Parties authorised to evolve this token type
    pub maintainers: Vec<NodeId>,

    /// Version counter, starting at 1; bumped on every update
    pub version: u32,
}

impl TokenType {
    /// Create a version-1 definition issued now
    pub fn new(
        reference: impl Into<String>,
        valuation: Option<Decimal>,
        fraction_digits: u32,
        maintainers: Vec<NodeId>,
    ) -> Self {
        TokenType {
            reference: reference.into(),
            valuation,
            issued_at: Utc::now(),
            fraction_digits,
            maintainers,
            version: 1,
        }
    }
}
