//! Reqwest-backed HTTP transport.

use async_trait::async_trait;
use reqwest::{Client, header};
use tracing::{debug, warn};

use crate::domain::errors::{ApiError, ApiResult};
use crate::domain::ports::{ApiRequest, ApiResponse, HttpTransport};

/// Puts [`ApiRequest`]s on the wire against one backend.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates transport sharing `client` (and its cookie store).
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let url = self.url(request.path());
        debug!(method = %request.method(), %url, "Sending request");

        let mut builder = self.client.request(request.method().clone(), &url);
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(authorization) = request.authorization() {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, %url, "Request failed");
            map_send_error(&e)
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::transport(format!("failed to read response body: {e}")))?;

        debug!(%status, bytes = body.len(), "Response received");
        Ok(ApiResponse::new(status, body))
    }
}

fn map_send_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::timeout("request timed out")
    } else if e.is_connect() {
        ApiError::connect("failed to connect to server")
    } else if e.is_builder() {
        ApiError::invalid_request(e.to_string())
    } else {
        ApiError::transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(Client::new(), "http://localhost:8080/")
    }

    #[test]
    fn test_url_joins_relative_paths() {
        let t = transport();
        assert_eq!(t.url("/api/stocks"), "http://localhost:8080/api/stocks");
        assert_eq!(t.url("api/stocks"), "http://localhost:8080/api/stocks");
        assert_eq!(t.url("https://cdn.example.com/a"), "https://cdn.example.com/a");
    }

    #[tokio::test]
    async fn test_refused_connection_maps_to_connect_error() {
        let t = ReqwestTransport::new(Client::new(), "http://127.0.0.1:9");

        let result = t.execute(&ApiRequest::get("/api/stocks")).await;

        assert!(result.unwrap_err().is_transport());
    }
}
