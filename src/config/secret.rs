//! Redacted holder for Discord webhook URLs.

use serde::Deserialize;

/// A Discord webhook URL, or any other value that must not be printed.
///
/// The path of a webhook URL (`/api/webhooks/<id>/<token>`) is the
/// credential: whoever holds it can post to the channel. The URL therefore
/// lives in this wrapper from the moment settings are read until
/// `HttpTransport` hands it to reqwest. `Debug` and `Display` print
/// `[REDACTED]`, so `DiscordConfig`, `DiscordNotifier` and `WebhookRequest`
/// can be logged or formatted freely. Transport errors are separately
/// stripped of the request URL before they are reported.
///
/// # Example
///
/// ```
/// use discord_notifier::config::SecretString;
///
/// let secret = SecretString::new("https://discord.com/api/webhooks/1/abc".to_string());
/// assert_eq!(format!("{:?}", secret), "[REDACTED]");
/// assert_eq!(secret.expose(), "https://discord.com/api/webhooks/1/abc");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: String) -> Self {
        SecretString(s)
    }

    /// The raw URL, for building the outgoing request only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(SecretString::new(s))
    }
}
