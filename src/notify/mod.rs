//! Notification channels for alert groups.
//!
//! # Architecture
//!
//! ```text
//! AlertGroup -> NotificationChannel::notify -> build_payload -> WebhookTransport
//! ```
//!
//! - `NotificationChannel` is the seam the notification pipeline calls
//! - `DiscordNotifier` renders templates and builds the Discord payload
//! - `WebhookTransport` performs the HTTP call (or prints it, for dry runs)
//! - `ChannelRegistry` holds the configured channels by name

pub mod discord;
pub mod payload;
mod registry;
mod traits;
pub mod webhook;

pub use discord::{DiscordNotifier, FOOTER_ICON_URL, PRODUCT_NAME, RULE_LIST_PATH, join_url_path};
pub use payload::{DiscordPayload, Embed, EmbedFooter};
pub use registry::ChannelRegistry;
pub use traits::NotificationChannel;
pub use webhook::{HttpTransport, StdoutTransport, WebhookRequest, WebhookTransport};

#[cfg(test)]
mod tests;
