//! Token Provider Port - Source of bearer tokens for backend calls.
//!
//! Token issuance is out of scope; adapters only hand out whatever token
//! the host application already holds.

use async_trait::async_trait;
use secrecy::SecretString;

/// Port for obtaining the current bearer token.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<SecretString, AuthError>;
}

/// Token lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no token available")]
    Missing,

    #[error("token provider failed: {0}")]
    Provider(String),
}
