//! HTTP event-stream connector.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use reqwest::{Client, header};
use tracing::{debug, warn};

use super::codec::SseDecoder;
use super::constants::{
    CONNECTION_TIMEOUT, EVENT_STREAM_CONTENT_TYPE, STREAM_PATH, TOKEN_QUERY_PARAM,
};
use crate::domain::entities::AccessToken;
use crate::domain::errors::{StreamError, StreamResult};
use crate::domain::ports::{EventStreamConnector, FrameStream, StreamFrame};

type ByteStream = BoxStream<'static, reqwest::Result<bytes::Bytes>>;

/// Opens the notification stream over HTTP.
///
/// The access token travels as a query parameter and is fixed for the life of
/// one connection.
pub struct HttpEventStreamConnector {
    client: Client,
    url: String,
}

impl HttpEventStreamConnector {
    /// Creates connector for `{base_url}{stream_path}`.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(base_url: &str, stream_path: &str) -> StreamResult<Self> {
        // No overall timeout: the response body is the long-lived stream.
        let client = Client::builder()
            .connect_timeout(CONNECTION_TIMEOUT)
            .build()
            .map_err(|e| {
                StreamError::connection_failed(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), stream_path),
        })
    }

    /// Creates connector for the default stream path.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn with_base_url(base_url: &str) -> StreamResult<Self> {
        Self::new(base_url, STREAM_PATH)
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventStreamConnector for HttpEventStreamConnector {
    async fn connect(&self, token: &AccessToken) -> StreamResult<FrameStream> {
        debug!(url = %self.url, token = %token, "Opening notification stream");

        let response = self
            .client
            .get(&self.url)
            .query(&[(TOKEN_QUERY_PARAM, token.as_str())])
            .header(header::ACCEPT, EVENT_STREAM_CONTENT_TYPE)
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StreamError::connection_failed("connection timed out")
                } else if e.is_connect() {
                    StreamError::connection_failed("failed to connect to notification stream")
                } else {
                    StreamError::connection_failed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Notification stream rejected");
            return Err(StreamError::Rejected {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with(EVENT_STREAM_CONTENT_TYPE) {
            return Err(StreamError::protocol(format!(
                "unexpected content type '{content_type}'"
            )));
        }

        Ok(frames(response.bytes_stream().boxed()))
    }
}

fn frames(bytes: ByteStream) -> FrameStream {
    stream::unfold(
        (bytes, SseDecoder::new(), VecDeque::<StreamResult<StreamFrame>>::new()),
        |(mut bytes, mut decoder, mut ready)| async move {
            loop {
                if let Some(item) = ready.pop_front() {
                    return Some((item, (bytes, decoder, ready)));
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        ready.extend(decoder.push(&chunk).into_iter().map(Ok));
                        if let Err(e) = decoder.check_pending() {
                            ready.push_back(Err(e));
                        }
                    }
                    Some(Err(e)) => {
                        return Some((
                            Err(StreamError::transport(e.to_string())),
                            (bytes, decoder, ready),
                        ));
                    }
                    None => return None,
                }
            }
        },
    )
    .boxed()
}
