//! Authenticated request pipeline with renew-and-replay on 401.

use std::sync::Arc;

use tracing::{debug, warn};

use super::credential_store::CredentialStore;
use super::refresh_coordinator::RefreshCoordinator;
use crate::domain::entities::AccessToken;
use crate::domain::errors::{ApiError, ApiResult};
use crate::domain::ports::{ApiRequest, ApiResponse, HttpTransport};

/// Sends requests with the current credential attached.
///
/// An unauthorized response triggers one credential renewal through the
/// shared [`RefreshCoordinator`] and one replay of the original request. Every
/// other status is returned untouched.
#[derive(Clone)]
pub struct RequestPipeline {
    transport: Arc<dyn HttpTransport>,
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl RequestPipeline {
    #[must_use]
    pub const fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            transport,
            store,
            coordinator,
        }
    }

    /// Sends `request`, renewing the credential and replaying once on 401.
    ///
    /// # Errors
    /// Returns [`ApiError::Transport`] on network failure,
    /// [`ApiError::SessionExpired`] if renewal fails, and
    /// [`ApiError::Unauthorized`] if the replay is rejected as well.
    pub async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let sent_with = self.store.token();
        let first = self
            .transport
            .execute(&prepare(&request, sent_with.as_ref()))
            .await?;

        if !first.is_unauthorized() {
            return Ok(first);
        }

        debug!(
            method = %request.method(),
            path = request.path(),
            "Request unauthorized, renewing credential"
        );

        let token = self.renewed_token(sent_with.as_ref()).await?;
        let replay = self.transport.execute(&request.authorized(&token)).await?;

        if replay.is_unauthorized() {
            warn!(
                method = %request.method(),
                path = request.path(),
                "Request still unauthorized after renewal"
            );
            return Err(ApiError::Unauthorized);
        }

        Ok(replay)
    }

    async fn renewed_token(&self, sent_with: Option<&AccessToken>) -> ApiResult<AccessToken> {
        if let Some(current) = self.store.token()
            && sent_with != Some(&current)
        {
            debug!("Credential already renewed by another request");
            return Ok(current);
        }

        let credential = self
            .coordinator
            .refresh()
            .await
            .map_err(ApiError::SessionExpired)?;
        Ok(credential.token().clone())
    }
}

fn prepare(request: &ApiRequest, token: Option<&AccessToken>) -> ApiRequest {
    token.map_or_else(|| request.clone(), |t| request.authorized(t))
}
