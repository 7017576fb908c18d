//! Error types for the token ledger engine
//!
//! All failures carry a stable kind plus a human-readable detail; none are
//! silently swallowed. Every validation failure is detected before any
//! mutation is applied, so no variant here ever implies a partially applied
//! transfer.

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger engine
///
/// The first block of variants is the transfer-boundary taxonomy; the second
/// covers token-type and node-holding failures; the rest are ambient I/O and
/// parsing errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// An account with this name already exists among live accounts
    #[error("Duplicate account name '{name}'")]
    DuplicateName {
        /// The contested account name
        name: String,
    },

    /// A named account referenced by a transfer does not resolve
    #[error("Account '{name}' does not exist")]
    AccountNotFound {
        /// The unresolved account name
        name: String,
    },

    /// The transfer destination is empty, reserved, or unresolved
    #[error("Invalid destination '{name}': {reason}")]
    InvalidDestination {
        /// The offending destination name
        name: String,
        /// Why the destination was rejected
        reason: String,
    },

    /// The source account cannot cover the requested amount
    #[error(
        "Insufficient balance on account '{account}': balance {balance}, requested {requested}"
    )]
    InsufficientBalance {
        account: String,
        balance: Decimal,
        requested: Decimal,
    },

    /// A zero or negative amount was requested
    #[error("Invalid amount {amount}: amounts must be strictly positive")]
    InvalidAmount { amount: Decimal },

    /// Concurrent transfers collided on a shared account and retries ran out
    #[error("Concurrent update conflict after {attempts} attempts")]
    Conflict { attempts: u32 },

    /// The external node-to-node token move failed or timed out
    ///
    /// The whole transfer is aborted; no account delta is left visible.
    /// Never retried automatically.
    #[error("External token move failed: {detail}")]
    ExternalMoveFailed { detail: String },

    /// No token type is registered under the given pointer or reference
    #[error("Token type '{reference}' is not registered")]
    TokenTypeNotFound { reference: String },

    /// A token type definition failed its create/update checks
    #[error("Invalid token type definition: {reason}")]
    InvalidTokenType { reason: String },

    /// A node's vault holding cannot cover the requested quantity
    #[error("Insufficient holding for {holder}: held {held}, requested {requested}")]
    InsufficientHolding {
        holder: String,
        held: Decimal,
        requested: Decimal,
    },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for '{account}'")]
    ArithmeticOverflow { operation: String, account: String },

    /// I/O error while reading input or writing the report
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// A boundary row could not be parsed or converted
    #[error("Parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        line: Option<u64>,
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());
        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl LedgerError {
    /// Stable short name of this failure kind, used as the boundary `error`
    /// field
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::DuplicateName { .. } => "DuplicateName",
            LedgerError::AccountNotFound { .. } => "AccountNotFound",
            LedgerError::InvalidDestination { .. } => "InvalidDestination",
            LedgerError::InsufficientBalance { .. } => "InsufficientBalance",
            LedgerError::InvalidAmount { .. } => "InvalidAmount",
            LedgerError::Conflict { .. } => "Conflict",
            LedgerError::ExternalMoveFailed { .. } => "ExternalMoveFailed",
            LedgerError::TokenTypeNotFound { .. } => "TokenTypeNotFound",
            LedgerError::InvalidTokenType { .. } => "InvalidTokenType",
            LedgerError::InsufficientHolding { .. } => "InsufficientHolding",
            LedgerError::ArithmeticOverflow { .. } => "ArithmeticOverflow",
            LedgerError::IoError { .. } => "IoError",
            LedgerError::ParseError { .. } => "ParseError",
        }
    }

    /// Create a DuplicateName error
    pub fn duplicate_name(name: &str) -> Self {
        LedgerError::DuplicateName {
            name: name.to_string(),
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(name: &str) -> Self {
        LedgerError::AccountNotFound {
            name: name.to_string(),
        }
    }

    /// Create an InvalidDestination error
    pub fn invalid_destination(name: &str, reason: &str) -> Self {
        LedgerError::InvalidDestination {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(account: &str, balance: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientBalance {
            account: account.to_string(),
            balance,
            requested,
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create a Conflict error
    pub fn conflict(attempts: u32) -> Self {
        LedgerError::Conflict { attempts }
    }

    /// Create an ExternalMoveFailed error
    pub fn external_move_failed(detail: impl Into<String>) -> Self {
        LedgerError::ExternalMoveFailed {
            detail: detail.into(),
        }
    }

    /// Create a TokenTypeNotFound error
    pub fn token_type_not_found(reference: impl Into<String>) -> Self {
        LedgerError::TokenTypeNotFound {
            reference: reference.into(),
        }
    }

    /// Create an InvalidTokenType error
    pub fn invalid_token_type(reason: &str) -> Self {
        LedgerError::InvalidTokenType {
            reason: reason.to_string(),
        }
    }

    /// Create an InsufficientHolding error
    pub fn insufficient_holding(holder: &str, held: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientHolding {
            holder: holder.to_string(),
            held,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }
}
