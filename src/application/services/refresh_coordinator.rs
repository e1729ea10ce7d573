//! Single-flight renewal of the access credential.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::credential_store::CredentialStore;
use crate::domain::entities::Credential;
use crate::domain::errors::AuthError;
use crate::domain::ports::{AuthPort, StorageScope};

type RefreshResult = Result<Credential, AuthError>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshResult>>;

const EXPIRED_CHANNEL_CAPACITY: usize = 8;

/// Renews the credential at most once at a time.
///
/// Concurrent callers attach to the renewal already in flight and all observe
/// its outcome. A failed renewal clears the credential store and is reported
/// as [`AuthError::SessionExpired`], both to the caller and to
/// [`subscribe_session_expired`](Self::subscribe_session_expired) listeners.
/// A renewal that completes after the store was cleared or replaced is
/// discarded and reported to the caller as session-expired.
pub struct RefreshCoordinator {
    auth_port: Arc<dyn AuthPort>,
    store: Arc<CredentialStore>,
    pending: Mutex<Option<PendingRefresh>>,
    expired_tx: broadcast::Sender<AuthError>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(auth_port: Arc<dyn AuthPort>, store: Arc<CredentialStore>) -> Self {
        let (expired_tx, _) = broadcast::channel(EXPIRED_CHANNEL_CAPACITY);
        Self {
            auth_port,
            store,
            pending: Mutex::new(None),
            expired_tx,
        }
    }

    /// Renews the credential, or joins the renewal already in flight.
    ///
    /// # Errors
    /// Returns [`AuthError::SessionExpired`] if renewal fails for any reason.
    pub async fn refresh(&self) -> RefreshResult {
        let pending = self.pending_or_start();
        let result = pending.clone().await;

        let mut slot = self.pending.lock();
        if slot.as_ref().is_some_and(|p| p.ptr_eq(&pending)) {
            *slot = None;
        }

        result
    }

    /// Returns whether a renewal is currently in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|p| p.peek().is_none())
    }

    /// Receives every session-expired condition.
    #[must_use]
    pub fn subscribe_session_expired(&self) -> broadcast::Receiver<AuthError> {
        self.expired_tx.subscribe()
    }

    fn pending_or_start(&self) -> PendingRefresh {
        let mut slot = self.pending.lock();

        if let Some(pending) = slot.as_ref()
            && pending.peek().is_none()
        {
            debug!("Joining credential renewal already in flight");
            return pending.clone();
        }

        let generation = self.store.generation();
        debug!(generation, "Starting credential renewal");
        let pending = renew(
            self.auth_port.clone(),
            self.store.clone(),
            self.expired_tx.clone(),
            generation,
        )
        .boxed()
        .shared();
        *slot = Some(pending.clone());
        pending
    }
}

async fn renew(
    auth_port: Arc<dyn AuthPort>,
    store: Arc<CredentialStore>,
    expired_tx: broadcast::Sender<AuthError>,
    generation: u64,
) -> RefreshResult {
    match auth_port.refresh().await {
        Ok(grant) => {
            let credential = match store.get() {
                Some(current) => current.renewed(grant),
                None => Credential::from(grant),
            };
            let scope = store.scope().unwrap_or(StorageScope::Session);

            match store
                .set_if_generation(generation, credential.clone(), scope)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    info!("Credential changed during renewal, discarding renewed token");
                    return Err(AuthError::session_expired(
                        "credential was replaced or cleared during renewal",
                    ));
                }
                Err(e) => warn!(error = %e, "Renewed credential could not be persisted"),
            }

            info!(%scope, "Access credential renewed");
            Ok(credential)
        }
        Err(e) => {
            warn!(error = %e, "Credential renewal failed, clearing session");

            if let Err(clear_err) = store.clear().await {
                warn!(error = %clear_err, "Failed to clear credential after renewal failure");
            }

            let expired = if e.is_session_expired() {
                e
            } else {
                AuthError::session_expired(e.to_string())
            };
            let _ = expired_tx.send(expired.clone());
            Err(expired)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{TimeDelta, Utc};

    use crate::domain::entities::{AccessToken, TokenGrant, UserProfile};
    use crate::domain::ports::mocks::{ManualClock, MockAuthPort, MockKeyValueStore};

    struct Fixture {
        auth: Arc<MockAuthPort>,
        durable: Arc<MockKeyValueStore>,
        session: Arc<MockKeyValueStore>,
        store: Arc<CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    }

    fn fixture(auth: MockAuthPort) -> Fixture {
        let auth = Arc::new(auth);
        let durable = Arc::new(MockKeyValueStore::new());
        let session = Arc::new(MockKeyValueStore::new());
        let store = Arc::new(CredentialStore::new(
            durable.clone(),
            session.clone(),
            Arc::new(ManualClock::default()),
        ));
        let coordinator = Arc::new(RefreshCoordinator::new(auth.clone(), store.clone()));
        Fixture {
            auth,
            durable,
            session,
            store,
            coordinator,
        }
    }

    async fn seed(store: &CredentialStore, scope: StorageScope) {
        let credential = Credential::new(AccessToken::new_unchecked("old"), Utc::now())
            .with_roles(["ADMIN"])
            .with_profile(UserProfile {
                user_id: 3,
                ..UserProfile::default()
            });
        store.set(credential, scope).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_replaces_token_keeping_profile() {
        let f = fixture(MockAuthPort::new());
        seed(&f.store, StorageScope::Durable).await;

        let renewed = f.coordinator.refresh().await.unwrap();

        assert_eq!(renewed.token().as_str(), "renewed-1");
        assert_eq!(renewed.profile().user_id, 3);
        assert!(renewed.has_role("ADMIN"));
        assert_eq!(f.store.get(), Some(renewed));
        assert_eq!(f.durable.snapshot()["authToken"], "renewed-1");
        assert!(!f.coordinator.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_renewal() {
        let f = fixture(MockAuthPort::new().with_refresh_delay(Duration::from_millis(200)));
        seed(&f.store, StorageScope::Session).await;

        let calls = (0..8).map(|_| {
            let coordinator = f.coordinator.clone();
            tokio::spawn(async move { coordinator.refresh().await })
        });
        let results = futures_util::future::join_all(calls).await;

        assert_eq!(f.auth.refresh_calls(), 1);
        for result in results {
            assert_eq!(result.unwrap().unwrap().token().as_str(), "renewed-1");
        }
    }

    #[tokio::test]
    async fn test_next_failure_starts_fresh_renewal() {
        let f = fixture(MockAuthPort::new());
        seed(&f.store, StorageScope::Session).await;

        f.coordinator.refresh().await.unwrap();
        let second = f.coordinator.refresh().await.unwrap();

        assert_eq!(f.auth.refresh_calls(), 2);
        assert_eq!(second.token().as_str(), "renewed-2");
    }

    #[tokio::test]
    async fn test_rejected_refresh_expires_session() {
        let auth = MockAuthPort::new();
        auth.push_refresh(Err(AuthError::InvalidCredentials));
        let f = fixture(auth);
        seed(&f.store, StorageScope::Durable).await;
        let mut expired_rx = f.coordinator.subscribe_session_expired();

        let result = f.coordinator.refresh().await;

        assert!(matches!(result, Err(AuthError::SessionExpired { .. })));
        assert!(f.store.get().is_none());
        assert!(f.durable.is_empty());
        assert!(f.session.is_empty());
        assert!(expired_rx.try_recv().unwrap().is_session_expired());
    }

    #[tokio::test]
    async fn test_refresh_without_credential_uses_session_scope() {
        let auth = MockAuthPort::new();
        auth.push_refresh(Ok(TokenGrant {
            token: AccessToken::new_unchecked("cookie-renewed"),
            expires_at: Utc::now() + TimeDelta::hours(1),
        }));
        let f = fixture(auth);

        let renewed = f.coordinator.refresh().await.unwrap();

        assert_eq!(renewed.token().as_str(), "cookie-renewed");
        assert_eq!(f.store.scope(), Some(StorageScope::Session));
        assert_eq!(f.session.snapshot()["authToken"], "cookie-renewed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_during_renewal_is_not_undone() {
        let f = fixture(MockAuthPort::new().with_refresh_delay(Duration::from_millis(100)));
        seed(&f.store, StorageScope::Durable).await;
        let mut expired_rx = f.coordinator.subscribe_session_expired();

        let coordinator = f.coordinator.clone();
        let renewal = tokio::spawn(async move { coordinator.refresh().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        f.store.clear().await.unwrap();

        let result = renewal.await.unwrap();

        assert!(result.unwrap_err().is_session_expired());
        assert!(f.store.get().is_none());
        assert!(!f.store.is_authorized());
        assert!(f.durable.is_empty());
        assert!(f.session.is_empty());
        assert!(expired_rx.try_recv().is_err());
        assert!(!f.coordinator.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_during_renewal_keeps_new_credential() {
        let f = fixture(MockAuthPort::new().with_refresh_delay(Duration::from_millis(100)));
        seed(&f.store, StorageScope::Durable).await;

        let coordinator = f.coordinator.clone();
        let renewal = tokio::spawn(async move { coordinator.refresh().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let fresh = Credential::new(
            AccessToken::new_unchecked("fresh-login"),
            Utc::now() + TimeDelta::hours(1),
        );
        f.store.set(fresh, StorageScope::Session).await.unwrap();

        assert!(renewal.await.unwrap().is_err());
        assert_eq!(f.store.token().unwrap().as_str(), "fresh-login");
        assert_eq!(f.session.snapshot()["authToken"], "fresh-login");
    }

    #[tokio::test]
    async fn test_failure_then_success_recovers() {
        let auth = MockAuthPort::new();
        auth.push_refresh(Err(AuthError::network("reset")));
        let f = fixture(auth);

        assert!(f.coordinator.refresh().await.is_err());
        let renewed = f.coordinator.refresh().await.unwrap();

        assert_eq!(renewed.token().as_str(), "renewed-2");
        assert_eq!(f.auth.refresh_calls(), 2);
    }
}
