//! Channel registry for managing named notification channels.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{CHANNEL_TYPE_DISCORD, Config, DiscordConfig, NotificationChannelConfig};
use crate::error::ConfigError;
use crate::template::TemplateSet;

use super::{DiscordNotifier, NotificationChannel, WebhookTransport};

/// Registry of configured channels, looked up by name.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, Arc<dyn NotificationChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// Register a channel by name.
    ///
    /// Fails if a channel with the same name already exists.
    pub fn register(&mut self, channel: Arc<dyn NotificationChannel>) -> Result<(), ConfigError> {
        let name = channel.name().to_string();
        if self.channels.contains_key(&name) {
            return Err(ConfigError::ValidationError(format!(
                "channel '{}' already registered",
                name
            )));
        }
        self.channels.insert(name, channel);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn NotificationChannel>> {
        self.channels.get(name).cloned()
    }

    /// Registered channel names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.channels.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Instantiates every configured channel.
    ///
    /// All channels share `templates` and `transport`. Every construction
    /// error is collected before returning.
    pub fn from_config(
        config: &Config,
        templates: Arc<TemplateSet>,
        transport: Arc<dyn WebhookTransport>,
    ) -> Result<Self, Vec<ConfigError>> {
        let mut registry = ChannelRegistry::new();
        let mut errors = Vec::new();

        for (key, model) in &config.channels {
            let created = Self::create_channel(
                model,
                &config.build_version,
                Arc::clone(&templates),
                Arc::clone(&transport),
            )
            .map_err(|e| ConfigError::InvalidChannel {
                name: key.clone(),
                message: e.to_string(),
            });

            match created {
                Ok(channel) => {
                    if let Err(e) = registry.register(channel) {
                        errors.push(e);
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() {
            Ok(registry)
        } else {
            Err(errors)
        }
    }

    fn create_channel(
        model: &NotificationChannelConfig,
        build_version: &str,
        templates: Arc<TemplateSet>,
        transport: Arc<dyn WebhookTransport>,
    ) -> Result<Arc<dyn NotificationChannel>, ConfigError> {
        match model.channel_type.as_str() {
            CHANNEL_TYPE_DISCORD => {
                let config = DiscordConfig::from_channel_config(model)?;
                let channel = DiscordNotifier::new(&model.name, config, templates, transport)
                    .with_build_version(build_version);

                tracing::info!(
                    channel_name = %model.name,
                    channel_type = CHANNEL_TYPE_DISCORD,
                    disable_resolve_message = model.disable_resolve_message,
                    "Registered channel from config"
                );

                Ok(Arc::new(channel))
            }
            other => Err(ConfigError::ValidationError(format!(
                "unsupported channel type '{}'",
                other
            ))),
        }
    }
}
