//! HTTP transport abstraction and the reqwest implementation

use crate::TransportError;
use async_trait::async_trait;
use http::Method;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// An outgoing request
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    /// Create a request without headers or body
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// A received response.
///
/// The status line always arrived; the body may have failed to arrive.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    status: u16,
    body: std::result::Result<Vec<u8>, String>,
}

impl TransportResponse {
    /// A response whose body was read in full
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: Ok(body.into()),
        }
    }

    /// A response whose body could not be read
    pub fn unreadable(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            body: Err(reason.into()),
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Raw body bytes
    pub fn bytes(&self) -> std::result::Result<&[u8], TransportError> {
        self.body
            .as_deref()
            .map_err(|reason| TransportError::Body(reason.clone()))
    }

    /// Body as lossy UTF-8 text, if it was readable
    pub fn text_lossy(&self) -> Option<String> {
        self.body
            .as_ref()
            .ok()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Sends HTTP requests on behalf of verification and delivery
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and wait at most `timeout` for the response
    async fn send(
        &self,
        request: TransportRequest,
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// Default cap on response bodies read by [`ReqwestTransport`]
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Transport backed by a shared [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    max_body_size: usize,
}

impl ReqwestTransport {
    /// Build a client with the given User-Agent
    pub fn new(user_agent: &str) -> std::result::Result<Self, TransportError> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self::from_client(client))
    }

    /// Wrap an existing client
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Set the largest response body that will be read.
    ///
    /// Larger bodies are reported as unreadable.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    async fn read_body(
        &self,
        mut response: reqwest::Response,
    ) -> std::result::Result<Vec<u8>, String> {
        let too_large = || format!("response body exceeds {} bytes", self.max_body_size);

        if response
            .content_length()
            .is_some_and(|len| len > self.max_body_size as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
            if body.len() + chunk.len() > self.max_body_size {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .timeout(timeout);

        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else if e.is_builder() {
                TransportError::InvalidRequest(e.to_string())
            } else {
                TransportError::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        Ok(match self.read_body(response).await {
            Ok(body) => TransportResponse::new(status, body),
            Err(reason) => TransportResponse::unreadable(status, reason),
        })
    }
}
