//! Token type registry
//!
//! Holds the evolvable token type definitions. A definition is validated at
//! creation and again on every update; later versions replace earlier ones
//! under the same stable pointer id.

use crate::types::{LedgerError, TokenType, TokenTypeId};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Thread-safe registry of token type definitions keyed by pointer id
#[derive(Debug, Default)]
pub struct TokenTypeRegistry {
    tokens: DashMap<TokenTypeId, TokenType>,
}

impl TokenTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        TokenTypeRegistry {
            tokens: DashMap::new(),
        }
    }

    /// Register a new token type under a freshly minted pointer id
    ///
    /// # Errors
    ///
    /// Returns `InvalidTokenType` if the definition fails its creation checks
    /// (non-positive valuation, future issue date, no maintainers).
    pub fn create(&self, mut token: TokenType) -> Result<TokenTypeId, LedgerError> {
        validate_definition(&token)?;
        token.version = 1;

        let id = TokenTypeId::fresh();
        self.tokens.insert(id, token);
        Ok(id)
    }

    /// Replace the definition under an existing pointer id
    ///
    /// The new definition is re-validated and must keep the `reference`
    /// unchanged. On success the stored version counter is bumped and the new
    /// version number returned.
    ///
    /// # Errors
    ///
    /// * `TokenTypeNotFound` - no definition exists under the pointer id
    /// * `InvalidTokenType` - the reference changed or a validation check failed
    pub fn update(&self, id: TokenTypeId, token: TokenType) -> Result<u32, LedgerError> {
        let mut entry = self
            .tokens
            .get_mut(&id)
            .ok_or_else(|| LedgerError::token_type_not_found(id.to_string()))?;

        if entry.reference != token.reference {
            return Err(LedgerError::invalid_token_type(
                "the reference cannot change across versions",
            ));
        }
        validate_definition(&token)?;

        let next_version = entry.version + 1;
        *entry = TokenType {
            version: next_version,
            ..token
        };
        Ok(next_version)
    }

    /// Resolve a pointer id to the latest version of its definition
    pub fn get(&self, id: TokenTypeId) -> Option<TokenType> {
        self.tokens.get(&id).map(|entry| entry.clone())
    }

    /// Find a token type by its business reference
    pub fn find_by_reference(&self, reference: &str) -> Option<(TokenTypeId, TokenType)> {
        self.tokens
            .iter()
            .find(|entry| entry.reference == reference)
            .map(|entry| (*entry.key(), entry.value().clone()))
    }
}

/// Checks run on every create and update of a token type definition
fn validate_definition(token: &TokenType) -> Result<(), LedgerError> {
    if let Some(valuation) = token.valuation {
        if valuation <= Decimal::ZERO {
            return Err(LedgerError::invalid_token_type(
                "valuation must be strictly positive",
            ));
        }
    }
    if token.issued_at > Utc::now() {
        return Err(LedgerError::invalid_token_type(
            "issue date must not be in the future",
        ));
    }
    if token.maintainers.is_empty() {
        return Err(LedgerError::invalid_token_type(
            "at least one maintainer is required",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;
    use chrono::Duration;

    fn definition(reference: &str, valuation: Option<Decimal>) -> TokenType {
        TokenType::new(reference, valuation, 2, vec![NodeId::new("PartyA")])
    }

    #[test]
    fn test_create_registers_and_resolves() {
        let registry = TokenTypeRegistry::new();

        let id = registry.create(definition("DVT", None)).unwrap();

        let token = registry.get(id).unwrap();
        assert_eq!(token.reference, "DVT");
        assert_eq!(token.version, 1);
    }

    #[test]
    fn test_create_rejects_non_positive_valuation() {
        let registry = TokenTypeRegistry::new();

        let result = registry.create(definition("AKK", Some(Decimal::ZERO)));

        assert!(matches!(
            result,
            Err(LedgerError::InvalidTokenType { .. })
        ));
    }

    #[test]
    fn test_create_rejects_future_issue_date() {
        let registry = TokenTypeRegistry::new();

        let mut token = definition("DVT", None);
        token.issued_at = Utc::now() + Duration::hours(1);

        let result = registry.create(token);
        assert!(matches!(
            result,
            Err(LedgerError::InvalidTokenType { .. })
        ));
    }

    #[test]
    fn test_create_rejects_empty_maintainers() {
        let registry = TokenTypeRegistry::new();

        let mut token = definition("DVT", None);
        token.maintainers.clear();

        let result = registry.create(token);
        assert!(matches!(
            result,
            Err(LedgerError::InvalidTokenType { .. })
        ));
    }

    #[test]
    fn test_update_bumps_version_under_same_pointer() {
        let registry = TokenTypeRegistry::new();
        let id = registry.create(definition("AKK", Some(Decimal::ONE))).unwrap();

        let new_version = registry
            .update(id, definition("AKK", Some(Decimal::TWO)))
            .unwrap();

        assert_eq!(new_version, 2);
        let token = registry.get(id).unwrap();
        assert_eq!(token.valuation, Some(Decimal::TWO));
        assert_eq!(token.version, 2);
    }

    #[test]
    fn test_update_rejects_reference_change() {
        let registry = TokenTypeRegistry::new();
        let id = registry.create(definition("AKK", Some(Decimal::ONE))).unwrap();

        let result = registry.update(id, definition("OTHER", Some(Decimal::ONE)));

        assert!(matches!(
            result,
            Err(LedgerError::InvalidTokenType { .. })
        ));
        // Previous version still served
        assert_eq!(registry.get(id).unwrap().version, 1);
    }

    #[test]
    fn test_update_missing_pointer_fails() {
        let registry = TokenTypeRegistry::new();

        let result = registry.update(TokenTypeId::fresh(), definition("AKK", None));

        assert!(matches!(
            result,
            Err(LedgerError::TokenTypeNotFound { .. })
        ));
    }

    #[test]
    fn test_find_by_reference() {
        let registry = TokenTypeRegistry::new();
        let id = registry.create(definition("DVT", None)).unwrap();

        let (found_id, token) = registry.find_by_reference("DVT").unwrap();
        assert_eq!(found_id, id);
        assert_eq!(token.reference, "DVT");
        assert!(registry.find_by_reference("missing").is_none());
    }
}
