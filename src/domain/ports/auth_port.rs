//! Authentication port definition.

use async_trait::async_trait;

use crate::domain::entities::{Credential, TokenGrant};
use crate::domain::errors::AuthError;

/// Port for backend authentication operations.
#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Exchanges identity and secret for a credential.
    async fn login(&self, identity: &str, secret: &str) -> Result<Credential, AuthError>;

    /// Renews the access token using the out-of-band refresh credential.
    async fn refresh(&self) -> Result<TokenGrant, AuthError>;
}
