use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::HeaderMap, StatusCode};

use crate::HttpClientError;

/// One transport-level response to a GET request.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `None` when the body is absent or could not be read.
    pub body: Option<Bytes>,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Some(body.into()),
        }
    }

    /// A response whose body stream is absent.
    pub fn without_body(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl fmt::Display for TransportResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusCode: {}", self.status)?;
        for (name, value) in &self.headers {
            match value.to_str() {
                Ok(value) => write!(f, "\n  {name}: {value}")?,
                Err(_) => write!(f, "\n  {name}: {value:?}")?,
            }
        }
        Ok(())
    }
}

/// Issues GET requests. Implementations are shared across concurrent calls.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, uri: &str) -> Result<TransportResponse, HttpClientError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps a caller-configured client, e.g. one with a request timeout.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, uri: &str) -> Result<TransportResponse, HttpClientError> {
        let response = self.http.get(uri).send().await?;

        let status = response.status();
        let headers = response.headers().clone();

        // The response is consumed here, so the connection is released
        // before returning on both paths.
        let body = match response.bytes().await {
            Ok(bytes) => Some(bytes),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("response body from {} is unreadable: {}", uri, _err);
                None
            }
        };

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
