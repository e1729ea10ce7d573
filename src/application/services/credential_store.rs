//! Process-local holder of the current credential, mirrored to key/value storage.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::domain::entities::{
    ADMIN_ROLE, AccessToken, Credential, DEFAULT_TIER, UserProfile,
};
use crate::domain::errors::AuthError;
use crate::domain::ports::{Clock, KeyValueStore, StorageScope};

pub const TOKEN_KEY: &str = "authToken";
pub const USER_ID_KEY: &str = "userId";
pub const USER_NAME_KEY: &str = "userName";
pub const TIER_CODE_KEY: &str = "tierCode";
pub const IMAGE_URL_KEY: &str = "imageURL";
pub const STATUS_MESSAGE_KEY: &str = "statusMessage";
pub const ROLES_KEY: &str = "roles";
pub const EXPIRES_AT_KEY: &str = "expiresAt";

/// Every key a credential occupies in a storage scope.
pub const CREDENTIAL_KEYS: [&str; 8] = [
    TOKEN_KEY,
    USER_ID_KEY,
    USER_NAME_KEY,
    TIER_CODE_KEY,
    IMAGE_URL_KEY,
    STATUS_MESSAGE_KEY,
    ROLES_KEY,
    EXPIRES_AT_KEY,
];

#[derive(Debug, Clone)]
struct Current {
    credential: Credential,
    scope: StorageScope,
}

/// Owns the current credential.
///
/// Readers always observe a whole credential: token, expiry, roles, and
/// profile are swapped together under one lock. Writers are serialized so the
/// persisted copy matches the order of in-memory updates.
///
/// Every `set` and `clear` advances a generation counter, so a writer that
/// started from an older snapshot can commit conditionally with
/// [`set_if_generation`](Self::set_if_generation).
pub struct CredentialStore {
    current: RwLock<Option<Current>>,
    generation: AtomicU64,
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    writer: Mutex<()>,
    authorized_tx: watch::Sender<bool>,
}

impl CredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (authorized_tx, _) = watch::channel(false);
        Self {
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
            durable,
            session,
            clock,
            writer: Mutex::new(()),
            authorized_tx,
        }
    }

    /// Creates a store and loads any credential left in storage.
    ///
    /// The durable scope wins over the session scope.
    ///
    /// # Errors
    /// Returns error if a scope cannot be read.
    pub async fn restore(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let store = Self::new(durable, session, clock);

        for scope in [StorageScope::Durable, StorageScope::Session] {
            if let Some(credential) = load_credential(store.scope_store(scope)).await? {
                info!(
                    %scope,
                    user_id = credential.profile().user_id,
                    "Restored stored credential"
                );
                *store.current.write() = Some(Current { credential, scope });
                store.publish();
                break;
            }
        }

        Ok(store)
    }

    /// Returns a copy of the current credential.
    #[must_use]
    pub fn get(&self) -> Option<Credential> {
        self.current.read().as_ref().map(|c| c.credential.clone())
    }

    /// Returns the current access token.
    #[must_use]
    pub fn token(&self) -> Option<AccessToken> {
        self.current
            .read()
            .as_ref()
            .map(|c| c.credential.token().clone())
    }

    /// Returns the scope the current credential was stored in.
    #[must_use]
    pub fn scope(&self) -> Option<StorageScope> {
        self.current.read().as_ref().map(|c| c.scope)
    }

    /// Returns whether a credential is present and unexpired.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        let now = self.clock.now();
        self.current
            .read()
            .as_ref()
            .is_some_and(|c| c.credential.is_valid_at(now))
    }

    /// Returns whether the current credential carries `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.current
            .read()
            .as_ref()
            .is_some_and(|c| c.credential.has_role(role))
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    /// Generation of the current credential; changes on every `set` and `clear`.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Watches the authorization flag as of the latest `set`/`clear`.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authorized_tx.subscribe()
    }

    /// Replaces the credential and mirrors it to `scope`, purging the other scope.
    ///
    /// The in-memory credential is replaced even if persisting fails.
    ///
    /// # Errors
    /// Returns error if storage rejects the write.
    pub async fn set(&self, credential: Credential, scope: StorageScope) -> Result<(), AuthError> {
        let _guard = self.writer.lock().await;
        self.commit(credential, scope).await
    }

    /// Like [`set`](Self::set), but only if nothing was set or cleared since
    /// `generation` was read.
    ///
    /// Returns `Ok(false)` and leaves the store untouched when the generation
    /// has moved.
    ///
    /// # Errors
    /// Returns error if storage rejects the write.
    pub async fn set_if_generation(
        &self,
        generation: u64,
        credential: Credential,
        scope: StorageScope,
    ) -> Result<bool, AuthError> {
        let _guard = self.writer.lock().await;

        let current = self.generation();
        if current != generation {
            debug!(expected = generation, current, "Credential changed, skipping write");
            return Ok(false);
        }

        self.commit(credential, scope).await.map(|()| true)
    }

    async fn commit(&self, credential: Credential, scope: StorageScope) -> Result<(), AuthError> {
        let entries = encode_credential(&credential)?;
        *self.current.write() = Some(Current { credential, scope });
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.publish();

        debug!(%scope, "Persisting credential");
        self.scope_store(other_scope(scope))
            .remove_entries(&CREDENTIAL_KEYS)
            .await?;
        self.scope_store(scope).set_entries(&entries).await
    }

    /// Drops the credential and purges every credential key from both scopes.
    ///
    /// # Errors
    /// Returns the first storage failure; both scopes are still attempted.
    pub async fn clear(&self) -> Result<(), AuthError> {
        let _guard = self.writer.lock().await;

        *self.current.write() = None;
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.publish();

        let durable = self.durable.remove_entries(&CREDENTIAL_KEYS).await;
        let session = self.session.remove_entries(&CREDENTIAL_KEYS).await;

        if let Err(e) = &durable {
            warn!(error = %e, "Failed to purge durable credential storage");
        }
        if let Err(e) = &session {
            warn!(error = %e, "Failed to purge session credential storage");
        }

        debug!("Credential cleared");
        durable.and(session)
    }

    fn scope_store(&self, scope: StorageScope) -> &dyn KeyValueStore {
        match scope {
            StorageScope::Durable => self.durable.as_ref(),
            StorageScope::Session => self.session.as_ref(),
        }
    }

    fn publish(&self) {
        self.authorized_tx.send_replace(self.is_authorized());
    }
}

const fn other_scope(scope: StorageScope) -> StorageScope {
    match scope {
        StorageScope::Durable => StorageScope::Session,
        StorageScope::Session => StorageScope::Durable,
    }
}

fn encode_credential(credential: &Credential) -> Result<Vec<(&'static str, String)>, AuthError> {
    let profile = credential.profile();
    let roles: Vec<&String> = credential.roles().iter().collect();
    let roles = serde_json::to_string(&roles)
        .map_err(|e| AuthError::storage_failed(format!("failed to encode roles: {e}")))?;

    Ok(vec![
        (TOKEN_KEY, credential.token().as_str().to_string()),
        (USER_ID_KEY, profile.user_id.to_string()),
        (USER_NAME_KEY, profile.user_name.clone()),
        (TIER_CODE_KEY, profile.tier_code.clone()),
        (IMAGE_URL_KEY, profile.image_url.clone()),
        (STATUS_MESSAGE_KEY, profile.status_message.clone()),
        (ROLES_KEY, roles),
        (
            EXPIRES_AT_KEY,
            credential.expires_at().timestamp_millis().to_string(),
        ),
    ])
}

async fn read_text(store: &dyn KeyValueStore, key: &str) -> Result<String, AuthError> {
    Ok(store.get(key).await?.unwrap_or_default())
}

async fn load_credential(store: &dyn KeyValueStore) -> Result<Option<Credential>, AuthError> {
    let Some(token) = store.get(TOKEN_KEY).await?.and_then(AccessToken::new) else {
        return Ok(None);
    };

    let user_id = read_text(store, USER_ID_KEY).await?.parse().unwrap_or(0);
    let tier_code = Some(read_text(store, TIER_CODE_KEY).await?)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TIER.to_string());
    let roles: Vec<String> = serde_json::from_str(&read_text(store, ROLES_KEY).await?)
        .unwrap_or_else(|e| {
            debug!(error = %e, "Stored roles unreadable, assuming none");
            Vec::new()
        });
    let expires_at = read_text(store, EXPIRES_AT_KEY)
        .await?
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or(DateTime::UNIX_EPOCH);

    let profile = UserProfile {
        user_id,
        user_name: read_text(store, USER_NAME_KEY).await?,
        tier_code,
        image_url: read_text(store, IMAGE_URL_KEY).await?,
        status_message: read_text(store, STATUS_MESSAGE_KEY).await?,
    };

    Ok(Some(
        Credential::new(token, expires_at)
            .with_roles(roles)
            .with_profile(profile),
    ))
}
