//! Collaborator-facing client that wires the networking core together.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::application::services::{CredentialStore, RefreshCoordinator, RequestPipeline};
use crate::application::use_cases::LoginUseCase;
use crate::application::{LoginRequest, LoginResponse};
use crate::domain::StreamStatus;
use crate::domain::entities::{AccessToken, Credential, NotificationEvent};
use crate::domain::errors::{ApiError, ApiResult, AuthError, StreamError, StreamResult};
use crate::domain::ports::{ApiRequest, ApiResponse, AuthPort, EventStreamConnector, HttpTransport};
use crate::infrastructure::config::{AppConfig, StorageManager};
use crate::infrastructure::notifications::{
    BackoffPolicy, NotificationClient, StreamSignal, SubscriptionId,
};
use crate::infrastructure::{
    FileKeyValueStore, HttpAuthClient, HttpEventStreamConnector, MemoryKeyValueStore,
    ReqwestTransport, SystemClock, build_client,
};

/// Failure while assembling a client from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("http client: {0}")]
    Http(#[from] ApiError),
    #[error("notification stream: {0}")]
    Stream(#[from] StreamError),
    #[error("credential storage: {0}")]
    Storage(#[from] AuthError),
}

/// Notification settings for [`StockwireClient::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotificationOptions {
    pub enabled: bool,
    pub backoff: BackoffPolicy,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Authenticated requests plus the live notification stream.
///
/// Every instance owns its own credential store, renewal coordinator, and
/// stream; nothing is process-global.
pub struct StockwireClient {
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    pipeline: RequestPipeline,
    login: LoginUseCase,
    notifications: NotificationClient,
    notifications_enabled: bool,
}

impl StockwireClient {
    #[must_use]
    pub fn new(
        auth_port: Arc<dyn AuthPort>,
        transport: Arc<dyn HttpTransport>,
        connector: Arc<dyn EventStreamConnector>,
        store: Arc<CredentialStore>,
        options: NotificationOptions,
    ) -> Self {
        let coordinator = Arc::new(RefreshCoordinator::new(auth_port.clone(), store.clone()));
        let pipeline = RequestPipeline::new(transport, store.clone(), coordinator.clone());

        Self {
            login: LoginUseCase::new(auth_port, store.clone()),
            notifications: NotificationClient::new(connector, options.backoff),
            notifications_enabled: options.enabled,
            store,
            coordinator,
            pipeline,
        }
    }

    /// Builds a client against the configured backend and restores any
    /// stored credential.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built or stored credentials
    /// cannot be read.
    pub async fn from_config(
        config: &AppConfig,
        storage: &StorageManager,
    ) -> Result<Self, SetupError> {
        let http = build_client(config.api.timeout())?;
        let transport = Arc::new(ReqwestTransport::new(http, config.api.base_url.clone()));
        let auth = Arc::new(HttpAuthClient::with_paths(
            transport.clone(),
            config.api.login_path.clone(),
            config.api.refresh_path.clone(),
        ));
        let connector = Arc::new(HttpEventStreamConnector::new(
            &config.api.base_url,
            &config.notifications.stream_path,
        )?);

        let durable = Arc::new(FileKeyValueStore::open(storage.credentials_path()).await?);
        let session = Arc::new(MemoryKeyValueStore::new());
        let clock = Arc::new(SystemClock::new());
        let store = Arc::new(CredentialStore::restore(durable, session, clock).await?);

        debug!(base_url = %config.api.base_url, "Client assembled");

        Ok(Self::new(
            auth,
            transport,
            connector,
            store,
            NotificationOptions {
                enabled: config.notifications.enabled,
                backoff: config.notifications.backoff_policy(),
            },
        ))
    }

    /// Logs in; `persist` keeps the credential across restarts.
    ///
    /// # Errors
    /// Returns error if the backend rejects the credentials or cannot be reached.
    pub async fn login(
        &self,
        identity: &str,
        secret: &str,
        persist: bool,
    ) -> Result<LoginResponse, AuthError> {
        let mut request = LoginRequest::new(identity, secret);
        if !persist {
            request = request.without_persistence();
        }
        self.login.execute(request).await
    }

    /// Closes the notification stream and forgets the credential everywhere.
    ///
    /// # Errors
    /// Returns error if stored credentials cannot be purged.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.notifications.disconnect();
        self.login.logout().await
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.store.is_authorized()
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.store.has_role(role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.store.is_admin()
    }

    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.store.get()
    }

    #[must_use]
    pub fn token(&self) -> Option<AccessToken> {
        self.store.token()
    }

    /// Sends a request with renew-and-replay on 401.
    ///
    /// # Errors
    /// See [`RequestPipeline::send`].
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        self.pipeline.send(request).await
    }

    /// Opens the notification stream with `token`.
    ///
    /// A no-op when notifications are disabled. The token is fixed for the
    /// life of the connection; reconnect to pick up a renewed one.
    ///
    /// # Errors
    /// Returns `StreamError::AlreadyConnected` if the stream is already active.
    pub fn connect_notifications(&self, token: AccessToken) -> StreamResult<()> {
        if !self.notifications_enabled {
            info!("Notification stream is disabled, not connecting");
            return Ok(());
        }
        self.notifications.connect(token)
    }

    pub fn disconnect_notifications(&self) {
        self.notifications.disconnect();
    }

    #[must_use]
    pub fn notification_status(&self) -> StreamStatus {
        self.notifications.status()
    }

    #[must_use]
    pub fn is_notifications_connected(&self) -> bool {
        self.notifications.is_connected()
    }

    pub fn on_notification(
        &self,
        callback: impl Fn(&NotificationEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.notifications.registry().on_event(callback)
    }

    pub fn on_error(
        &self,
        callback: impl Fn(&StreamError) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.notifications.registry().on_error(callback)
    }

    pub fn on_connected(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.notifications.registry().on_connected(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifications.registry().unsubscribe(id)
    }

    /// Receives stream signals as a queue instead of callbacks.
    #[must_use]
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<StreamSignal> {
        self.notifications.registry().subscribe()
    }

    /// Fires whenever renewal fails and the session is forcibly ended.
    #[must_use]
    pub fn subscribe_session_expired(&self) -> broadcast::Receiver<AuthError> {
        self.coordinator.subscribe_session_expired()
    }

    #[must_use]
    pub fn subscribe_authorized(&self) -> watch::Receiver<bool> {
        self.store.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use parking_lot::Mutex;
    use reqwest::StatusCode;

    use crate::application::services::CREDENTIAL_KEYS;
    use crate::domain::ports::StreamFrame;
    use crate::domain::ports::mocks::{
        ManualClock, MockAuthPort, MockKeyValueStore, ScriptedAttempt, ScriptedConnector,
        ScriptedTransport,
    };

    struct Fixture {
        auth: Arc<MockAuthPort>,
        durable: Arc<MockKeyValueStore>,
        session: Arc<MockKeyValueStore>,
        connector: Arc<ScriptedConnector>,
        client: StockwireClient,
    }

    fn fixture(transport: ScriptedTransport, options: NotificationOptions) -> Fixture {
        let auth = Arc::new(MockAuthPort::new());
        let durable = Arc::new(MockKeyValueStore::new());
        let session = Arc::new(MockKeyValueStore::new());
        let connector = Arc::new(ScriptedConnector::new());
        let store = Arc::new(CredentialStore::new(
            durable.clone(),
            session.clone(),
            Arc::new(ManualClock::default()),
        ));
        let client = StockwireClient::new(
            auth.clone(),
            Arc::new(transport),
            connector.clone(),
            store,
            options,
        );
        Fixture {
            auth,
            durable,
            session,
            connector,
            client,
        }
    }

    fn ok_transport() -> ScriptedTransport {
        ScriptedTransport::new(|_| Ok(ApiResponse::new(StatusCode::OK, "")))
    }

    #[tokio::test]
    async fn test_login_then_logout_clears_both_scopes() {
        let f = fixture(ok_transport(), NotificationOptions::default());

        f.client.login("kim@example.com", "pw", true).await.unwrap();
        assert!(f.client.is_authorized());
        assert!(f.client.has_role("USER"));
        assert!(!f.client.is_admin());
        assert_eq!(f.durable.snapshot().len(), CREDENTIAL_KEYS.len());

        f.client.logout().await.unwrap();

        assert!(!f.client.is_authorized());
        assert!(f.durable.is_empty());
        assert!(f.session.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_disconnects_stream() {
        let f = fixture(ok_transport(), NotificationOptions::default());
        f.connector.push(ScriptedAttempt::Open(vec![]));
        f.client.login("kim@example.com", "pw", false).await.unwrap();

        f.client
            .connect_notifications(f.client.token().unwrap())
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(f.client.is_notifications_connected());

        f.client.logout().await.unwrap();

        assert_eq!(f.client.notification_status(), StreamStatus::Idle);
        assert_eq!(f.connector.tokens(), vec!["login-token".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_notifications_never_connect() {
        let f = fixture(
            ok_transport(),
            NotificationOptions {
                enabled: false,
                ..NotificationOptions::default()
            },
        );

        f.client
            .connect_notifications(AccessToken::new_unchecked("t"))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(f.connector.attempt_count(), 0);
        assert_eq!(f.client.notification_status(), StreamStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_notification_receives_stream_events() {
        let f = fixture(ok_transport(), NotificationOptions::default());
        f.connector.push(ScriptedAttempt::Open(vec![Ok(StreamFrame::new(
            None,
            r#"{"type":"count_update","count":5}"#,
        ))]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        f.client.on_notification(move |e| sink.lock().push(e.clone()));

        f.client
            .connect_notifications(AccessToken::new_unchecked("t"))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(*seen.lock(), vec![NotificationEvent::count_update(5)]);
    }

    #[tokio::test]
    async fn test_send_renews_and_session_expiry_is_broadcast() {
        let f = fixture(
            ScriptedTransport::new(|_| Ok(ApiResponse::new(StatusCode::UNAUTHORIZED, ""))),
            NotificationOptions::default(),
        );
        f.auth.push_refresh(Err(AuthError::InvalidCredentials));
        f.client.login("kim@example.com", "pw", true).await.unwrap();
        let mut expired = f.client.subscribe_session_expired();
        let authorized = f.client.subscribe_authorized();
        assert!(*authorized.borrow());

        let result = f.client.send(ApiRequest::get("/api/reports")).await;

        assert!(result.unwrap_err().is_session_expired());
        assert!(expired.try_recv().unwrap().is_session_expired());
        assert!(!*authorized.borrow());
        assert!(f.durable.is_empty());
    }
}
