//! HTTP transport port and the replayable request/response values it moves.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::entities::AccessToken;
use crate::domain::errors::{ApiError, ApiResult};

/// Outbound request, owned so it can be replayed verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    authorization: Option<String>,
}

impl ApiRequest {
    /// Creates request for a path relative to the backend base URL.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            authorization: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends a header. `Authorization` is managed by the pipeline.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a raw body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `value` as the JSON body.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn with_json<T: Serialize + ?Sized>(self, value: &T) -> ApiResult<Self> {
        let body = serde_json::to_vec(value)
            .map_err(|e| ApiError::invalid_request(format!("failed to encode body: {e}")))?;
        Ok(self
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    /// Returns a copy carrying `token` as bearer authorization.
    #[must_use]
    pub fn authorized(&self, token: &AccessToken) -> Self {
        let mut request = self.clone();
        request.authorization = Some(token.bearer());
        request
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the `Authorization` header value, if attached.
    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }
}

/// Response as received, with the body fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: StatusCode,
    body: Bytes,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    /// Returns error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::decode(e.to_string()))
    }

    /// Returns the body as lossy UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Port that puts a prepared request on the wire.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends request and buffers the response; non-2xx statuses are not errors.
    async fn execute(&self, request: &ApiRequest) -> ApiResult<ApiResponse>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorized_copy_only_changes_authorization() {
        let original = ApiRequest::post("/api/reports")
            .with_query("page", "2")
            .with_body("{\"a\":1}");
        let token = AccessToken::new_unchecked("abc");

        let authorized = original.authorized(&token);

        assert_eq!(authorized.authorization(), Some("Bearer abc"));
        assert_eq!(authorized.method(), original.method());
        assert_eq!(authorized.path(), original.path());
        assert_eq!(authorized.query(), original.query());
        assert_eq!(authorized.body(), original.body());
        assert!(original.authorization().is_none());
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let request = ApiRequest::post("/x")
            .with_json(&serde_json::json!({"k": "v"}))
            .unwrap();

        assert!(
            request
                .headers()
                .iter()
                .any(|(k, v)| k == "content-type" && v == "application/json")
        );
        assert_eq!(request.body().unwrap().as_ref(), br#"{"k":"v"}"#);
    }

    #[test]
    fn test_response_json_decode_error() {
        let response = ApiResponse::new(StatusCode::OK, "not json");
        let result: ApiResult<serde_json::Value> = response.json();
        assert!(matches!(result, Err(ApiError::Decode { .. })));
    }
}
