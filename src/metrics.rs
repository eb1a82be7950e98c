//! Metric descriptions.
//!
//! Counters are emitted through the `metrics` facade; exposition is left to
//! whichever recorder the embedding process installs.

/// Counter incremented for every delivered notification.
pub const NOTIFICATIONS_SENT_TOTAL: &str = "discord_notifier_notifications_sent_total";

/// Counter incremented for every failed notification, labelled by `kind`.
pub const NOTIFY_ERRORS_TOTAL: &str = "discord_notifier_notify_errors_total";

/// Gauge set to 1 with the crate version as a label.
pub const BUILD_INFO: &str = "discord_notifier_build_info";

/// Register all metric descriptions.
///
/// Call once at startup after the recorder is installed. Descriptions
/// provide HELP text for exporters that support it.
pub fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        NOTIFICATIONS_SENT_TOTAL,
        "Total number of notifications delivered to a webhook"
    );
    describe_counter!(
        NOTIFY_ERRORS_TOTAL,
        "Total number of notifications that failed (template, path, serialization or delivery)"
    );
    describe_gauge!(
        BUILD_INFO,
        "Build information with version label (always 1)"
    );
}

/// Records the build info gauge.
pub fn record_build_info() {
    metrics::gauge!(BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}
