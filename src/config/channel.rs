//! Notification channel records and Discord channel settings.

use super::env::resolve_env_vars;
use super::secret::SecretString;
use crate::error::ConfigError;
use crate::template::DEFAULT_MESSAGE_REF;
use serde::{Deserialize, Deserializer};

/// Channel type tag for Discord channels.
pub const CHANNEL_TYPE_DISCORD: &str = "discord";

/// A notification channel record as stored by the settings store.
///
/// `settings` is kept as raw JSON; each channel type interprets it.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationChannelConfig {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub channel_type: String,
    #[serde(default)]
    pub disable_resolve_message: bool,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
}

impl NotificationChannelConfig {
    /// Creates a Discord channel record with the given settings.
    pub fn discord(name: impl Into<String>, settings: Option<serde_json::Value>) -> Self {
        Self {
            uid: String::new(),
            name: name.into(),
            channel_type: CHANNEL_TYPE_DISCORD.to_string(),
            disable_resolve_message: false,
            settings,
        }
    }

    #[must_use]
    pub fn with_disable_resolve_message(mut self, disable: bool) -> Self {
        self.disable_resolve_message = disable;
        self
    }
}

/// Discord settings shape: `{ url, avatar_url?, message? }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscordSettings {
    /// A non-string `url` is treated as absent.
    #[serde(default, deserialize_with = "string_or_absent")]
    pub url: Option<SecretString>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn string_or_absent<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Ok(Some(SecretString::new(s))),
        _ => Ok(None),
    }
}

/// Validated Discord channel configuration.
///
/// Built once per channel and read-only afterwards.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub webhook_url: SecretString,
    /// Avatar URL template; empty means no avatar override.
    pub avatar_url: String,
    /// Message template for the `content` field.
    pub message_template: String,
    pub disable_resolve_message: bool,
}

impl DiscordConfig {
    /// Builds the configuration from a stored channel record.
    ///
    /// Only presence and shape are checked here; templates are not parsed
    /// and the webhook is not contacted.
    pub fn from_channel_config(model: &NotificationChannelConfig) -> Result<Self, ConfigError> {
        let raw = model
            .settings
            .as_ref()
            .ok_or(ConfigError::MissingSettings)?
            .as_object()
            .ok_or_else(|| ConfigError::InvalidSettings("settings must be an object".to_string()))?;
        // a map keeps serde from accepting a sequence as a positional struct
        let settings: DiscordSettings =
            serde_json::from_value(serde_json::Value::Object(raw.clone()))
                .map_err(|e| ConfigError::InvalidSettings(e.to_string()))?;
        Self::from_settings(settings, model.disable_resolve_message)
    }

    pub fn from_settings(
        settings: DiscordSettings,
        disable_resolve_message: bool,
    ) -> Result<Self, ConfigError> {
        let url = settings
            .url
            .as_ref()
            .map(|u| u.expose().trim())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingWebhookUrl)?;
        let url = resolve_env_vars(url)?;

        let message_template = settings
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MESSAGE_REF.to_string());

        let avatar_url = match settings.avatar_url.as_deref() {
            Some(avatar) => resolve_env_vars(avatar)?,
            None => String::new(),
        };

        Ok(Self {
            webhook_url: SecretString::new(url),
            avatar_url,
            message_template,
            disable_resolve_message,
        })
    }
}
