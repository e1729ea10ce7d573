//! Key/value storage port definition.

use async_trait::async_trait;

use crate::domain::errors::AuthError;

/// Where a credential is mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    /// Survives process restarts.
    Durable,
    /// Lives as long as the process.
    Session,
}

impl StorageScope {
    /// Selects the scope from a "stay logged in" flag.
    #[must_use]
    pub const fn from_persist(persist: bool) -> Self {
        if persist { Self::Durable } else { Self::Session }
    }
}

impl std::fmt::Display for StorageScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Durable => write!(f, "durable"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// Port for string key/value persistence.
///
/// Batch writes and removals are applied as one unit.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError>;

    /// Writes all entries.
    async fn set_entries(&self, entries: &[(&str, String)]) -> Result<(), AuthError>;

    /// Removes all keys; missing keys are ignored.
    async fn remove_entries(&self, keys: &[&str]) -> Result<(), AuthError>;

    /// Checks if key exists.
    async fn contains(&self, key: &str) -> Result<bool, AuthError> {
        Ok(self.get(key).await?.is_some())
    }
}
