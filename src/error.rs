//! Centralized error types for discord-notifier using thiserror.
//!
//! Configuration mistakes, template failures, URL composition, payload
//! encoding and delivery each get their own type so callers can tell a bad
//! channel setup apart from a transient transport failure.

use thiserror::Error;

/// Errors raised while loading configuration or constructing a channel.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no settings supplied")]
    MissingSettings,
    #[error("Could not find webhook url property in settings")]
    MissingWebhookUrl,
    #[error("invalid channel settings: {0}")]
    InvalidSettings(String),
    #[error("failed to load config file: {0}")]
    LoadError(String),
    #[error("invalid configuration: {0}")]
    ValidationError(String),
    #[error("invalid template '{name}': {message}")]
    InvalidTemplate { name: String, message: String },
    #[error("invalid channel '{name}': {message}")]
    InvalidChannel { name: String, message: String },
}

/// A template expansion that failed during a render pass.
///
/// `field` names the payload field being rendered; `message` is the
/// template engine's own error text, kept verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct TemplateError {
    pub field: String,
    pub message: String,
}

/// Errors reported by a webhook transport.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("webhook responded with status {status}")]
    Status { status: u16 },
    #[error("delivery cancelled")]
    Cancelled,
}

/// Errors returned by a notification channel for one notification cycle.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to template {channel} message: {source}")]
    Template {
        channel: &'static str,
        #[source]
        source: TemplateError,
    },
    #[error("failed to join '{base}' with rule list path: {source}")]
    Path {
        base: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to send notification: {0}")]
    Delivery(#[from] TransportError),
}

impl NotifyError {
    /// Short label used for the `kind` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            NotifyError::Template { .. } => "template",
            NotifyError::Path { .. } => "path",
            NotifyError::Serialization(_) => "serialization",
            NotifyError::Delivery(_) => "delivery",
        }
    }
}
