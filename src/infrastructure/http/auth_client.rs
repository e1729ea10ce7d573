//! Backend authentication client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::dto::{Envelope, LoginBody, LoginItem, RenewalItem};
use crate::domain::entities::{AccessToken, Credential, DEFAULT_TIER, TokenGrant, UserProfile};
use crate::domain::errors::AuthError;
use crate::domain::ports::{ApiRequest, ApiResponse, AuthPort, HttpTransport};

pub const LOGIN_PATH: &str = "/api/v1/auth/login";
pub const REFRESH_PATH: &str = "/api/v1/auth/refresh";

/// Login and renewal against the backend auth endpoints.
///
/// Renewal sends no body; the refresh cookie set at login rides along in the
/// transport's cookie store.
pub struct HttpAuthClient {
    transport: Arc<dyn HttpTransport>,
    login_path: String,
    refresh_path: String,
}

impl HttpAuthClient {
    /// Creates client with the default endpoint paths.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_paths(transport, LOGIN_PATH, REFRESH_PATH)
    }

    #[must_use]
    pub fn with_paths(
        transport: Arc<dyn HttpTransport>,
        login_path: impl Into<String>,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            login_path: login_path.into(),
            refresh_path: refresh_path.into(),
        }
    }
}

#[async_trait]
impl AuthPort for HttpAuthClient {
    async fn login(&self, identity: &str, secret: &str) -> Result<Credential, AuthError> {
        debug!(path = %self.login_path, "Posting login");

        let request = ApiRequest::post(&self.login_path)
            .with_json(&LoginBody {
                email: identity,
                password: secret,
            })
            .map_err(AuthError::from)?;
        let response = self.transport.execute(&request).await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED => {
                return Err(AuthError::InvalidCredentials);
            }
            status => {
                warn!(%status, "Login rejected");
                return Err(AuthError::unexpected(format!("login failed with status {status}")));
            }
        }

        let item: LoginItem = first_item(&response)?;
        let expires_at = from_epoch_millis(item.expires_at)?;
        let token = AccessToken::new(item.access_token)
            .ok_or_else(|| AuthError::malformed("empty access token"))?;

        let profile = UserProfile {
            user_id: item.user_id,
            user_name: item.user_name,
            tier_code: item
                .tier_code
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TIER.to_string()),
            image_url: item.image_url.unwrap_or_default(),
            status_message: item.status_message.unwrap_or_default(),
        };

        Ok(Credential::new(token, expires_at)
            .with_roles(item.roles)
            .with_profile(profile))
    }

    async fn refresh(&self) -> Result<TokenGrant, AuthError> {
        debug!(path = %self.refresh_path, "Requesting credential renewal");

        let response = self
            .transport
            .execute(&ApiRequest::post(&self.refresh_path))
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AuthError::session_expired(format!(
                "renewal rejected with status {status}"
            )));
        }
        if !status.is_success() {
            return Err(AuthError::unexpected(format!(
                "renewal failed with status {status}"
            )));
        }

        let item: RenewalItem = first_item(&response)?;
        Ok(TokenGrant {
            token: AccessToken::new(item.access_token)
                .ok_or_else(|| AuthError::malformed("empty access token"))?,
            expires_at: from_epoch_millis(item.expires_at)?,
        })
    }
}

fn first_item<T: DeserializeOwned>(response: &ApiResponse) -> Result<T, AuthError> {
    response
        .json::<Envelope<T>>()
        .map_err(AuthError::from)?
        .into_first()
        .ok_or_else(|| AuthError::malformed("response contained no items"))
}

fn from_epoch_millis(millis: i64) -> Result<DateTime<Utc>, AuthError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AuthError::malformed(format!("expiry out of range: {millis}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ApiError;
    use crate::domain::ports::mocks::ScriptedTransport;

    const LOGIN_OK: &str = r#"{
        "items": [{
            "accessToken": "abc.def",
            "userId": 12,
            "userName": "kim",
            "tierCode": "GOLD",
            "imageURL": null,
            "statusMessage": "hi",
            "roles": ["USER", "ADMIN"],
            "expiresAt": 1893456000000
        }]
    }"#;

    fn client(status: StatusCode, body: &'static str) -> (Arc<ScriptedTransport>, HttpAuthClient) {
        let transport = Arc::new(ScriptedTransport::new(move |_| {
            Ok(ApiResponse::new(status, body))
        }));
        (transport.clone(), HttpAuthClient::new(transport))
    }

    #[tokio::test]
    async fn test_login_maps_first_item() {
        let (transport, client) = client(StatusCode::OK, LOGIN_OK);

        let credential = client.login("kim@example.com", "pw").await.unwrap();

        assert_eq!(credential.token().as_str(), "abc.def");
        assert!(credential.has_role("ADMIN"));
        assert_eq!(credential.profile().user_id, 12);
        assert_eq!(credential.profile().tier_code, "GOLD");
        assert_eq!(credential.profile().image_url, "");
        assert_eq!(credential.expires_at().timestamp_millis(), 1_893_456_000_000);

        let sent = &transport.requests()[0];
        assert_eq!(sent.path(), LOGIN_PATH);
        assert!(sent.authorization().is_none());
        let body: serde_json::Value = serde_json::from_slice(sent.body().unwrap()).unwrap();
        assert_eq!(body["email"], "kim@example.com");
        assert_eq!(body["password"], "pw");
    }

    #[tokio::test]
    async fn test_login_defaults_missing_tier() {
        let (_, client) = client(
            StatusCode::OK,
            r#"{"items":[{"accessToken":"t","userId":"3","expiresAt":"1893456000000"}]}"#,
        );

        let credential = client.login("a", "b").await.unwrap();

        assert_eq!(credential.profile().tier_code, "BRONZE");
        assert_eq!(credential.profile().user_id, 3);
        assert!(credential.roles().is_empty());
    }

    #[tokio::test]
    async fn test_login_not_found_is_invalid_credentials() {
        let (_, client) = client(StatusCode::NOT_FOUND, "");
        assert_eq!(
            client.login("a", "b").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_login_transport_errors_map_to_auth_errors() {
        let refused = HttpAuthClient::new(Arc::new(ScriptedTransport::new(|_| {
            Err(ApiError::connect("refused"))
        })));
        let slow = HttpAuthClient::new(Arc::new(ScriptedTransport::new(|_| {
            Err(ApiError::timeout("timed out"))
        })));

        assert_eq!(
            refused.login("a", "b").await.unwrap_err(),
            AuthError::ServerUnreachable
        );
        assert_eq!(slow.login("a", "b").await.unwrap_err(), AuthError::Timeout);
    }

    #[tokio::test]
    async fn test_login_with_empty_items_is_malformed() {
        let (_, client) = client(StatusCode::OK, r#"{"items":[]}"#);
        assert!(matches!(
            client.login("a", "b").await,
            Err(AuthError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_refresh_reads_renewal_envelope() {
        let (transport, client) = client(
            StatusCode::OK,
            r#"{"items":[{"accessToken":"fresh","expiresAt":1893456000000}]}"#,
        );

        let grant = client.refresh().await.unwrap();

        assert_eq!(grant.token.as_str(), "fresh");
        let sent = &transport.requests()[0];
        assert_eq!(sent.path(), REFRESH_PATH);
        assert!(sent.body().is_none());
    }

    #[tokio::test]
    async fn test_refresh_unauthorized_is_session_expired() {
        let (_, client) = client(StatusCode::UNAUTHORIZED, "");
        assert!(client.refresh().await.unwrap_err().is_session_expired());
    }
}
