//! Discord notification channel.
//!
//! Renders the channel's templates against an alert group, assembles a
//! single-embed webhook payload and hands it to a [`WebhookTransport`].
//! Delivery is attempted once; retry belongs to the caller.

use crate::alert::AlertGroup;
use crate::color::color_for;
use crate::config::{CHANNEL_TYPE_DISCORD, DiscordConfig};
use crate::error::{NotifyError, TransportError};
use crate::metrics::{NOTIFICATIONS_SENT_TOTAL, NOTIFY_ERRORS_TOTAL};
use crate::notify::payload::{DiscordPayload, Embed, EmbedFooter};
use crate::notify::webhook::{WebhookRequest, WebhookTransport};
use crate::notify::NotificationChannel;
use crate::template::{DEFAULT_TITLE_REF, RenderPass, TemplateSet};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

/// Sender name shown on every message.
pub const PRODUCT_NAME: &str = "Grafana";

/// Icon shown next to the embed footer.
pub const FOOTER_ICON_URL: &str = "https://grafana.com/assets/img/fav32.png";

/// Path of the alert rule list, relative to the external URL.
pub const RULE_LIST_PATH: &str = "alerting/list";

const EMBED_TYPE_RICH: &str = "rich";

/// Discord channel bound to one validated configuration.
pub struct DiscordNotifier {
    name: String,
    config: DiscordConfig,
    templates: Arc<TemplateSet>,
    transport: Arc<dyn WebhookTransport>,
    build_version: String,
}

impl DiscordNotifier {
    pub fn new(
        name: impl Into<String>,
        config: DiscordConfig,
        templates: Arc<TemplateSet>,
        transport: Arc<dyn WebhookTransport>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            templates,
            transport,
            build_version: String::new(),
        }
    }

    /// Sets the version shown in the footer (`Grafana v<version>`).
    #[must_use]
    pub fn with_build_version(mut self, version: impl Into<String>) -> Self {
        self.build_version = version.into();
        self
    }

    pub fn config(&self) -> &DiscordConfig {
        &self.config
    }

    /// Builds the webhook payload for `group`.
    ///
    /// Every template is expanded in one [`RenderPass`]. A failed rule list
    /// URL is reported before any template failure; a template failure
    /// discards the whole payload.
    pub fn build_payload(&self, group: &AlertGroup) -> Result<DiscordPayload, NotifyError> {
        let mut pass = RenderPass::new(&self.templates, group);

        let content = pass.render("content", &self.config.message_template);
        let avatar_url = if self.config.avatar_url.is_empty() {
            String::new()
        } else {
            pass.render("avatar_url", &self.config.avatar_url)
        };
        let title = pass.render("title", DEFAULT_TITLE_REF);

        let footer = EmbedFooter {
            text: format!("{} v{}", PRODUCT_NAME, self.build_version),
            icon_url: FOOTER_ICON_URL.to_string(),
        };
        let color = color_for(group.status);
        let url = join_url_path(&group.external_url, RULE_LIST_PATH)?;

        pass.finish().map_err(|source| NotifyError::Template {
            channel: CHANNEL_TYPE_DISCORD,
            source,
        })?;

        Ok(DiscordPayload {
            username: PRODUCT_NAME.to_string(),
            content: non_empty(content),
            avatar_url: non_empty(avatar_url),
            embeds: vec![Embed {
                title,
                color,
                footer,
                url,
                kind: EMBED_TYPE_RICH.to_string(),
            }],
        })
    }

    /// Builds the payload and encodes it as compact JSON.
    pub fn render_body(&self, group: &AlertGroup) -> Result<Vec<u8>, NotifyError> {
        let payload = self.build_payload(group)?;
        Ok(serde_json::to_vec(&payload)?)
    }

    async fn deliver(
        &self,
        group: &AlertGroup,
        cancel: &CancellationToken,
    ) -> Result<(), NotifyError> {
        let body = self.render_body(group)?;
        let request = WebhookRequest::post_json(self.config.webhook_url.clone(), body);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled.into()),
            result = self.transport.send(&request) => result.map_err(NotifyError::from),
        }
    }
}

#[async_trait]
impl NotificationChannel for DiscordNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &str {
        CHANNEL_TYPE_DISCORD
    }

    async fn notify(
        &self,
        group: &AlertGroup,
        cancel: &CancellationToken,
    ) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "send_discord",
            channel_name = %self.name,
            group_key = %group.group_key,
            status = %group.status,
            alerts = group.alerts.len()
        );

        async {
            match self.deliver(group, cancel).await {
                Ok(()) => {
                    tracing::debug!("Notification sent successfully");
                    metrics::counter!(
                        NOTIFICATIONS_SENT_TOTAL,
                        "channel_name" => self.name.clone()
                    )
                    .increment(1);
                    Ok(())
                }
                Err(e) => {
                    if let NotifyError::Delivery(_) = e {
                        tracing::error!(
                            channel_type = CHANNEL_TYPE_DISCORD,
                            channel_name = %self.name,
                            error = %e,
                            "Failed to send notification"
                        );
                    }
                    metrics::counter!(
                        NOTIFY_ERRORS_TOTAL,
                        "channel_name" => self.name.clone(),
                        "kind" => e.kind()
                    )
                    .increment(1);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    fn should_notify_on_resolve(&self) -> bool {
        !self.config.disable_resolve_message
    }
}

impl std::fmt::Debug for DiscordNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordNotifier")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("build_version", &self.build_version)
            .finish_non_exhaustive()
    }
}

/// Appends `path` to the path of `base`, keeping scheme, host and query.
///
/// `http://localhost` becomes `http://localhost/alerting/list` and
/// `https://host/grafana/` becomes `https://host/grafana/alerting/list`.
pub fn join_url_path(base: &str, path: &str) -> Result<String, NotifyError> {
    let mut url = Url::parse(base).map_err(|source| NotifyError::Path {
        base: base.to_string(),
        source,
    })?;

    let joined = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    Ok(url.to_string())
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}
