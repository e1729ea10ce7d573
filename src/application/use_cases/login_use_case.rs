//! Login and logout use case implementation.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::application::dto::{LoginRequest, LoginResponse};
use crate::application::services::CredentialStore;
use crate::domain::errors::AuthError;
use crate::domain::ports::AuthPort;

/// Handles user authentication workflow.
#[derive(Clone)]
pub struct LoginUseCase {
    auth_port: Arc<dyn AuthPort>,
    store: Arc<CredentialStore>,
}

impl LoginUseCase {
    /// Creates new login use case.
    #[must_use]
    pub const fn new(auth_port: Arc<dyn AuthPort>, store: Arc<CredentialStore>) -> Self {
        Self { auth_port, store }
    }

    /// Executes login with provided request.
    ///
    /// # Errors
    /// Returns error if the backend rejects the credentials or cannot be reached.
    pub async fn execute(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        if request.identity.trim().is_empty() || request.secret.is_empty() {
            warn!("Login attempted with empty identity or secret");
            return Err(AuthError::InvalidCredentials);
        }

        debug!(identity = %request.identity, "Attempting login");

        let credential = self
            .auth_port
            .login(request.identity.trim(), &request.secret)
            .await
            .map_err(|e| {
                warn!(error = %e, recoverable = e.is_recoverable(), "Login failed");
                e
            })?;

        let profile = credential.profile().clone();
        info!(
            user_id = profile.user_id,
            user_name = %profile.user_name,
            "Successfully authenticated"
        );

        let scope = request.scope();
        let persisted = match self.store.set(credential, scope).await {
            Ok(()) => {
                info!(%scope, "Credential persisted");
                true
            }
            Err(e) => {
                error!(error = %e, %scope, "Failed to persist credential");
                false
            }
        };

        Ok(LoginResponse::new(profile, scope, persisted))
    }

    /// Forgets the credential in memory and in both storage scopes.
    ///
    /// # Errors
    /// Returns error if storage cannot be purged.
    pub async fn logout(&self) -> Result<(), AuthError> {
        debug!("Logging out");
        match self.store.clear().await {
            Ok(()) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to purge stored credential");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::CREDENTIAL_KEYS;
    use crate::domain::ports::StorageScope;
    use crate::domain::ports::mocks::{ManualClock, MockAuthPort, MockKeyValueStore};

    struct Fixture {
        auth: Arc<MockAuthPort>,
        durable: Arc<MockKeyValueStore>,
        session: Arc<MockKeyValueStore>,
        store: Arc<CredentialStore>,
        use_case: LoginUseCase,
    }

    fn fixture() -> Fixture {
        let auth = Arc::new(MockAuthPort::new());
        let durable = Arc::new(MockKeyValueStore::new());
        let session = Arc::new(MockKeyValueStore::new());
        let store = Arc::new(CredentialStore::new(
            durable.clone(),
            session.clone(),
            Arc::new(ManualClock::default()),
        ));
        let use_case = LoginUseCase::new(auth.clone(), store.clone());
        Fixture {
            auth,
            durable,
            session,
            store,
            use_case,
        }
    }

    #[tokio::test]
    async fn test_persistent_login_uses_durable_scope() {
        let f = fixture();

        let response = f
            .use_case
            .execute(LoginRequest::new("kim@example.com", "pw"))
            .await
            .unwrap();

        assert_eq!(response.profile.user_name, "tester");
        assert_eq!(response.scope, StorageScope::Durable);
        assert!(response.persisted);
        assert_eq!(f.durable.snapshot()["authToken"], "login-token");
        assert!(f.session.is_empty());
        assert!(f.store.is_authorized());
    }

    #[tokio::test]
    async fn test_session_login_uses_session_scope() {
        let f = fixture();

        f.use_case
            .execute(LoginRequest::new("kim@example.com", "pw").without_persistence())
            .await
            .unwrap();

        assert!(f.durable.is_empty());
        assert_eq!(f.session.snapshot()["authToken"], "login-token");
    }

    #[tokio::test]
    async fn test_logout_removes_all_fields_from_both_scopes() {
        let f = fixture();
        f.use_case
            .execute(LoginRequest::new("kim@example.com", "pw"))
            .await
            .unwrap();
        assert_eq!(f.durable.snapshot().len(), CREDENTIAL_KEYS.len());

        f.use_case.logout().await.unwrap();

        assert!(f.durable.is_empty());
        assert!(f.session.is_empty());
        assert!(!f.store.is_authorized());
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_store_empty() {
        let f = fixture();
        f.auth.set_login_result(Err(AuthError::InvalidCredentials));

        let result = f
            .use_case
            .execute(LoginRequest::new("kim@example.com", "wrong"))
            .await;

        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
        assert!(f.store.get().is_none());
    }

    #[tokio::test]
    async fn test_empty_identity_rejected_without_backend_call() {
        let f = fixture();

        let result = f.use_case.execute(LoginRequest::new("  ", "pw")).await;

        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(f.auth.login_calls(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_still_logs_in() {
        let f = fixture();
        f.durable.set_fail_writes(true);

        let response = f
            .use_case
            .execute(LoginRequest::new("kim@example.com", "pw"))
            .await
            .unwrap();

        assert!(!response.persisted);
        assert!(f.store.is_authorized());
    }
}
