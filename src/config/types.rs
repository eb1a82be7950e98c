//! Core configuration types and loading.

use super::channel::{CHANNEL_TYPE_DISCORD, DiscordConfig, NotificationChannelConfig};
use super::env::resolve_template_sources;
use crate::error::ConfigError;
use crate::template::{TemplateSet, validate_template};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/discord-notifier/config.yaml";

/// Main configuration structure.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Version string shown in the embed footer (`Grafana v<version>`).
    #[serde(default)]
    pub build_version: String,
    /// HTTP client settings for webhook delivery.
    #[serde(default)]
    pub http: HttpConfig,
    /// Extra named templates, inline.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
    /// Extra named templates, loaded from files relative to the config file.
    #[serde(default)]
    pub template_files: BTreeMap<String, PathBuf>,
    /// Notification channels by name.
    #[serde(default)]
    pub channels: BTreeMap<String, NotificationChannelConfig>,
    /// Directory of the loaded config file.
    #[serde(skip)]
    pub config_dir: PathBuf,
}

/// HTTP client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_http_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// # Errors
    /// Returns [`ConfigError::LoadError`] if the file cannot be read.
    /// Returns [`ConfigError::ValidationError`] if the YAML is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::from_yaml(&content)?;
        config.config_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// Parse configuration from YAML text.
    ///
    /// Channel records without an explicit `name` take their map key.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        for (key, channel) in config.channels.iter_mut() {
            if channel.name.is_empty() {
                channel.name = key.clone();
            }
        }
        config.config_dir = PathBuf::from(".");
        Ok(config)
    }

    /// Builds the template set from the built-ins and configured templates.
    pub fn template_set(&self) -> Result<TemplateSet, ConfigError> {
        let sources =
            resolve_template_sources(&self.templates, &self.template_files, &self.config_dir)?;
        TemplateSet::with_templates(sources)
    }

    /// Validate the whole configuration, collecting every error.
    ///
    /// Unlike channel construction, this also parses each channel's message
    /// and avatar templates.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if self.http.timeout.is_zero() {
            errors.push(ConfigError::ValidationError(
                "http.timeout must be greater than zero".to_string(),
            ));
        }

        if let Err(e) = self.template_set() {
            errors.push(e);
        }

        if self.channels.is_empty() {
            errors.push(ConfigError::ValidationError(
                "at least one channel must be configured".to_string(),
            ));
        }

        for (name, channel) in &self.channels {
            if channel.channel_type != CHANNEL_TYPE_DISCORD {
                errors.push(ConfigError::InvalidChannel {
                    name: name.clone(),
                    message: format!("unsupported channel type '{}'", channel.channel_type),
                });
                continue;
            }

            let discord = match DiscordConfig::from_channel_config(channel) {
                Ok(d) => d,
                Err(e) => {
                    errors.push(ConfigError::InvalidChannel {
                        name: name.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            for (field, source) in [
                ("message", &discord.message_template),
                ("avatar_url", &discord.avatar_url),
            ] {
                if let Err(e) = validate_template(field, source) {
                    errors.push(ConfigError::InvalidChannel {
                        name: name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
