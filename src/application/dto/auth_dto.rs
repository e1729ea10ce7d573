//! Authentication DTOs.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::entities::UserProfile;
use crate::domain::ports::StorageScope;

/// Login request data.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LoginRequest {
    /// Account identity (email).
    pub identity: String,
    /// Account secret.
    pub secret: String,
    /// Whether to stay logged in across restarts.
    pub persist: bool,
}

impl LoginRequest {
    /// Creates new login request that persists the credential.
    #[must_use]
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
            persist: true,
        }
    }

    /// Keeps the credential for this session only.
    #[must_use]
    pub fn without_persistence(mut self) -> Self {
        self.persist = false;
        self
    }

    /// Returns the storage scope selected by the persist flag.
    #[must_use]
    pub const fn scope(&self) -> StorageScope {
        StorageScope::from_persist(self.persist)
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identity", &self.identity)
            .field("secret", &"***")
            .field("persist", &self.persist)
            .finish()
    }
}

/// Login response data.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    /// Profile of the authenticated user.
    pub profile: UserProfile,
    /// Scope the credential was written to.
    pub scope: StorageScope,
    /// Whether the credential reached storage.
    pub persisted: bool,
}

impl LoginResponse {
    /// Creates new login response.
    #[must_use]
    pub const fn new(profile: UserProfile, scope: StorageScope, persisted: bool) -> Self {
        Self {
            profile,
            scope,
            persisted,
        }
    }
}
