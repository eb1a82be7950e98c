//! Webhook delivery transport.
//!
//! Channels build a [`WebhookRequest`] and hand it to a [`WebhookTransport`].
//! [`HttpTransport`] performs the HTTP call with reqwest; [`StdoutTransport`]
//! prints the body instead, for dry runs.

use crate::config::SecretString;
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use std::io::Write;
use std::time::Duration;

/// Content type of every JSON webhook body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// A fully prepared webhook call.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub method: Method,
    pub url: SecretString,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl WebhookRequest {
    /// `POST` with a JSON body.
    pub fn post_json(url: SecretString, body: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            url,
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }
}

/// Performs webhook calls on behalf of notification channels.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Sends the request once. Any non-2xx response is an error.
    async fn send(&self, request: &WebhookRequest) -> Result<(), TransportError>;
}

/// HTTP transport backed by a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Wraps an existing client (shared for connection pooling).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client with the given request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn send(&self, request: &WebhookRequest) -> Result<(), TransportError> {
        let response = self
            .client
            .request(request.method.clone(), request.url.expose())
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body.clone())
            .send()
            .await
            // The URL carries the webhook token.
            .map_err(|e| TransportError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::trace!(status = %status, "Webhook accepted request");
            Ok(())
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
            })
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

/// Writes request bodies to stdout instead of sending them.
#[derive(Debug, Default)]
pub struct StdoutTransport;

#[async_trait]
impl WebhookTransport for StdoutTransport {
    async fn send(&self, request: &WebhookRequest) -> Result<(), TransportError> {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(&request.body)
            .and_then(|()| stdout.write_all(b"\n"))
            .and_then(|()| stdout.flush())
            .map_err(|e| TransportError::Request(e.to_string()))
    }
}
