//! Notification channel trait definition.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::alert::AlertGroup;
use crate::error::NotifyError;

/// A configured destination that alert groups are delivered to.
///
/// Implementations must be `Send + Sync`: one channel instance serves
/// concurrent notification cycles and holds no per-cycle state.
///
/// # Example
///
/// ```ignore
/// use discord_notifier::notify::NotificationChannel;
///
/// struct LogChannel { name: String }
///
/// #[async_trait]
/// impl NotificationChannel for LogChannel {
///     fn name(&self) -> &str { &self.name }
///     fn channel_type(&self) -> &str { "log" }
///     async fn notify(&self, group: &AlertGroup, _: &CancellationToken) -> Result<(), NotifyError> {
///         tracing::info!(alerts = group.alerts.len(), "alert group");
///         Ok(())
///     }
///     fn should_notify_on_resolve(&self) -> bool { true }
/// }
/// ```
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Unique name of this channel instance (e.g., "ops-discord").
    fn name(&self) -> &str;

    /// Type of the channel (e.g., "discord").
    fn channel_type(&self) -> &str;

    /// Builds and delivers one notification for `group`.
    ///
    /// `Ok(())` means the notification was delivered. Cancelling `cancel`
    /// abandons an in-flight delivery, which is reported as a delivery
    /// failure. No retry happens here.
    async fn notify(
        &self,
        group: &AlertGroup,
        cancel: &CancellationToken,
    ) -> Result<(), NotifyError>;

    /// Whether resolved-only groups should be sent to this channel at all.
    fn should_notify_on_resolve(&self) -> bool;
}

impl std::fmt::Debug for dyn NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("name", &self.name())
            .field("type", &self.channel_type())
            .finish()
    }
}
