//! Configuration loading and validation for discord-notifier.
//!
//! This module handles the YAML configuration file, the stored channel
//! record shape, Discord settings validation, and environment variables
//! for secrets.

mod channel;
mod env;
mod secret;
mod types;

pub use channel::{
    CHANNEL_TYPE_DISCORD, DiscordConfig, DiscordSettings, NotificationChannelConfig,
};
pub use env::{resolve_env_vars, resolve_template_sources};
pub use secret::SecretString;
pub use types::{Config, DEFAULT_CONFIG_PATH, HttpConfig};
