// src/lib.rs
//! discord-notifier - Discord webhook notifications for alert groups.

pub mod alert;
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notify;
pub mod template;

// Re-export commonly used types
pub use alert::{AlertGroup, AlertRecord, AlertStatus, GroupStatus};
pub use cli::LogFormat;
pub use color::color_for;
pub use metrics::register_metric_descriptions;
pub use notify::{
    ChannelRegistry, DiscordNotifier, DiscordPayload, HttpTransport, NotificationChannel,
    StdoutTransport, WebhookTransport,
};
pub use template::{RenderPass, TemplateSet};
