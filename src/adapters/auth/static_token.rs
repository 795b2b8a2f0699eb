//! Static token provider.
//!
//! Hands out a token the host application already obtained. Token
//! issuance and refresh are not handled here.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::ports::{AuthError, TokenProvider};

/// Serves a fixed bearer token, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    token: Option<SecretString>,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(SecretString::new(token.into())),
        }
    }

    pub fn from_secret(token: Option<SecretString>) -> Self {
        Self { token }
    }

    /// A provider with no token; every lookup fails with `Missing`.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<SecretString, AuthError> {
        self.token.clone().ok_or(AuthError::Missing)
    }
}
