//! Bearer token verification.
//!
//! Handlers never look at tokens directly. The [`Authenticated`] extractor
//! hands the token to whatever [`TokenVerifier`] the application state
//! carries and yields a typed [`Identity`].
//!
//! [`Authenticated`]: crate::extractors::Authenticated

use album_invitations_core::{Identity, ProfileId};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Why a token was not accepted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token is unknown, expired or malformed.
    #[error("invalid token")]
    InvalidToken,
}

/// Resolves a bearer token to the caller's identity.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] when the token does not identify a
    /// caller.
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Verifier backed by a fixed token table.
///
/// Intended for development and tests; production deployments plug a real
/// verifier behind [`TokenVerifier`].
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Identity>,
}

/// A token table entry that could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid token entry `{entry}`: expected token=user_id:email")]
pub struct TokenTableError {
    /// The offending entry.
    pub entry: String,
}

impl StaticTokenVerifier {
    /// Empty table; every token is rejected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` for `identity`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    /// Parse `token=user_id:email,...`. Blank entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TokenTableError`] for the first entry that is not of the
    /// form `token=user_id:email` with a numeric user id.
    pub fn parse(table: &str) -> Result<Self, TokenTableError> {
        let mut verifier = Self::new();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let invalid = || TokenTableError {
                entry: entry.to_string(),
            };
            let (token, rest) = entry.split_once('=').ok_or_else(invalid)?;
            let (user_id, email) = rest.split_once(':').ok_or_else(invalid)?;
            let user_id: u32 = user_id.trim().parse().map_err(|_| invalid())?;
            if token.trim().is_empty() {
                return Err(invalid());
            }
            verifier = verifier.with_token(
                token.trim(),
                Identity::new(ProfileId::new(user_id), email.trim()),
            );
        }
        Ok(verifier)
    }

    /// Number of registered tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[tokio::test]
    async fn parses_token_table() {
        let verifier =
            StaticTokenVerifier::parse("abc=1:alice@example.com, def=2:bob@example.com,").unwrap();

        assert_eq!(verifier.len(), 2);
        let identity = verifier.verify("def").await.unwrap();
        assert_eq!(identity.user_id, ProfileId::new(2));
        assert_eq!(identity.email, "bob@example.com");
        assert_eq!(verifier.verify("nope").await, Err(AuthError::InvalidToken));
    }

    #[test]
    fn rejects_malformed_entries() {
        assert!(StaticTokenVerifier::parse("abc").is_err());
        assert!(StaticTokenVerifier::parse("abc=x:alice@example.com").is_err());
        assert!(StaticTokenVerifier::parse("=1:alice@example.com").is_err());
        assert!(StaticTokenVerifier::parse("").unwrap().is_empty());
    }
}
