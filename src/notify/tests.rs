//! Unit tests for the notify module.

use super::*;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::alert::{AlertGroup, AlertRecord, AlertStatus};
use crate::config::{DiscordConfig, NotificationChannelConfig};
use crate::error::{NotifyError, TransportError};
use crate::template::TemplateSet;

/// Records every request and answers with a fixed status.
#[derive(Default)]
struct RecordingTransport {
    requests: Mutex<Vec<WebhookRequest>>,
    fail_with_status: Option<u16>,
}

impl RecordingTransport {
    fn failing(status: u16) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_with_status: Some(status),
        }
    }

    fn sent(&self) -> Vec<WebhookRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
    async fn send(&self, request: &WebhookRequest) -> Result<(), TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.fail_with_status {
            Some(status) => Err(TransportError::Status { status }),
            None => Ok(()),
        }
    }
}

/// Never completes.
struct StalledTransport;

#[async_trait]
impl WebhookTransport for StalledTransport {
    async fn send(&self, _request: &WebhookRequest) -> Result<(), TransportError> {
        std::future::pending().await
    }
}

fn discord_config(settings: Value) -> DiscordConfig {
    DiscordConfig::from_channel_config(&NotificationChannelConfig::discord(
        "discord_testing",
        Some(settings),
    ))
    .unwrap()
}

fn notifier_with(settings: Value, transport: Arc<dyn WebhookTransport>) -> DiscordNotifier {
    DiscordNotifier::new(
        "discord_testing",
        discord_config(settings),
        Arc::new(TemplateSet::default()),
        transport,
    )
}

fn alert(lbl1: &str, ann1: &str) -> AlertRecord {
    AlertRecord::firing([("alertname", "alert1"), ("lbl1", lbl1)])
        .with_annotations([("ann1", ann1)])
}

fn group(alerts: Vec<AlertRecord>) -> AlertGroup {
    AlertGroup::new(alerts, "http://localhost")
        .with_group_key("alertname")
        .with_group_labels([("alertname", "")])
}

fn body_json(request: &WebhookRequest) -> Value {
    serde_json::from_slice(&request.body).unwrap()
}

// ============================================================
// Payload building
// ============================================================

#[test]
fn default_payload_for_single_firing_alert() {
    let notifier = notifier_with(
        json!({"url": "http://localhost"}),
        Arc::new(RecordingTransport::default()),
    );
    let payload = notifier.build_payload(&group(vec![alert("val1", "annv1")])).unwrap();

    assert_eq!(payload.username, "Grafana");
    assert_eq!(payload.avatar_url, None);
    assert_eq!(payload.embeds.len(), 1);

    let embed = &payload.embeds[0];
    assert_eq!(embed.title, "[FIRING:1]  (val1)");
    assert_eq!(embed.color, 14_037_554);
    assert_eq!(embed.url, "http://localhost/alerting/list");
    assert_eq!(embed.kind, "rich");
    assert_eq!(embed.footer.text, "Grafana v");
    assert_eq!(embed.footer.icon_url, FOOTER_ICON_URL);

    let content = payload.content.unwrap();
    assert!(content.starts_with("**Firing**"), "got: {content:?}");
    assert!(content.contains(" - lbl1 = val1"));
    assert!(content.contains(" - ann1 = annv1"));
}

#[test]
fn custom_message_counts_firing_and_resolved() {
    let notifier = notifier_with(
        json!({
            "url": "http://localhost",
            "message": "{{ alerts.firing | length }} alerts are firing, {{ alerts.resolved | length }} are resolved"
        }),
        Arc::new(RecordingTransport::default()),
    );
    let payload = notifier
        .build_payload(&group(vec![alert("val1", "annv1"), alert("val2", "annv2")]))
        .unwrap();

    assert_eq!(
        payload.content.as_deref(),
        Some("2 alerts are firing, 0 are resolved")
    );
    assert_eq!(payload.embeds[0].title, "[FIRING:2]  ");
}

#[test]
fn resolved_group_uses_resolved_color() {
    let notifier = notifier_with(
        json!({"url": "http://localhost"}),
        Arc::new(RecordingTransport::default()),
    );
    let resolved = group(vec![alert("val1", "annv1").with_status(AlertStatus::Resolved)]);
    let payload = notifier.build_payload(&resolved).unwrap();

    assert_eq!(payload.embeds[0].color, 3_581_519);
    assert!(payload.embeds[0].title.starts_with("[RESOLVED]"));
}

#[test]
fn mixed_group_uses_firing_color() {
    let notifier = notifier_with(
        json!({"url": "http://localhost"}),
        Arc::new(RecordingTransport::default()),
    );
    let mixed = group(vec![
        alert("val1", "annv1"),
        alert("val2", "annv2").with_status(AlertStatus::Resolved),
    ]);
    let payload = notifier.build_payload(&mixed).unwrap();
    assert_eq!(payload.embeds[0].color, 14_037_554);
    assert!(payload.embeds[0].title.starts_with("[FIRING:1]"));
}

#[test]
fn avatar_url_and_build_version_are_applied() {
    let notifier = notifier_with(
        json!({
            "url": "http://localhost",
            "avatar_url": "https://example.com/{{ status }}.png"
        }),
        Arc::new(RecordingTransport::default()),
    )
    .with_build_version("8.1.0");
    let payload = notifier.build_payload(&group(vec![alert("val1", "annv1")])).unwrap();

    assert_eq!(
        payload.avatar_url.as_deref(),
        Some("https://example.com/firing.png")
    );
    assert_eq!(payload.embeds[0].footer.text, "Grafana v8.1.0");
}

#[test]
fn empty_rendered_content_is_omitted() {
    let notifier = notifier_with(
        json!({"url": "http://localhost", "message": "{% if false %}x{% endif %}"}),
        Arc::new(RecordingTransport::default()),
    );
    let body = notifier.render_body(&group(vec![alert("val1", "annv1")])).unwrap();
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert!(value.get("content").is_none());
    assert!(value.get("avatar_url").is_none());
}

#[test]
fn render_body_is_deterministic() {
    let notifier = notifier_with(
        json!({"url": "http://localhost", "avatar_url": "https://example.com/a.png"}),
        Arc::new(RecordingTransport::default()),
    );
    let g = group(vec![alert("val1", "annv1"), alert("val2", "annv2")]);

    let first = notifier.render_body(&g).unwrap();
    let second = notifier.render_body(&g).unwrap();
    assert_eq!(first, second);
}

#[test]
fn sub_path_external_url_is_joined() {
    let notifier = notifier_with(
        json!({"url": "http://localhost"}),
        Arc::new(RecordingTransport::default()),
    );
    let g = AlertGroup::new(vec![alert("val1", "annv1")], "https://grafana.example.com/org/");
    let payload = notifier.build_payload(&g).unwrap();
    assert_eq!(
        payload.embeds[0].url,
        "https://grafana.example.com/org/alerting/list"
    );
}

#[test]
fn template_syntax_error_fails_build() {
    let notifier = notifier_with(
        json!({"url": "http://localhost", "message": "{{ status }"}),
        Arc::new(RecordingTransport::default()),
    );
    let err = notifier
        .build_payload(&group(vec![alert("val1", "annv1")]))
        .unwrap_err();

    match &err {
        NotifyError::Template { channel, source } => {
            assert_eq!(*channel, "discord");
            assert_eq!(source.field, "content");
        }
        e => panic!("Expected Template error, got {:?}", e),
    }
    assert!(
        err.to_string()
            .starts_with("failed to template discord message: content: ")
    );
}

#[test]
fn avatar_template_error_is_reported_for_avatar_field() {
    let notifier = notifier_with(
        json!({"url": "http://localhost", "avatar_url": "{{ nope( }}"}),
        Arc::new(RecordingTransport::default()),
    );
    let err = notifier
        .build_payload(&group(vec![alert("val1", "annv1")]))
        .unwrap_err();
    match err {
        NotifyError::Template { source, .. } => assert_eq!(source.field, "avatar_url"),
        e => panic!("Expected Template error, got {:?}", e),
    }
}

#[test]
fn unparsable_external_url_is_a_path_error() {
    let notifier = notifier_with(
        json!({"url": "http://localhost"}),
        Arc::new(RecordingTransport::default()),
    );
    let g = AlertGroup::new(vec![alert("val1", "annv1")], "not a url");
    let err = notifier.build_payload(&g).unwrap_err();
    assert!(matches!(err, NotifyError::Path { .. }));
}

#[test]
fn path_error_is_reported_before_template_error() {
    let notifier = notifier_with(
        json!({"url": "http://localhost", "message": "{{ status }"}),
        Arc::new(RecordingTransport::default()),
    );
    let g = AlertGroup::new(vec![alert("val1", "annv1")], "");
    let err = notifier.build_payload(&g).unwrap_err();
    assert!(matches!(err, NotifyError::Path { .. }));
}

// ============================================================
// Notify
// ============================================================

#[tokio::test]
async fn notify_posts_json_to_webhook_url() {
    let transport = Arc::new(RecordingTransport::default());
    let notifier = notifier_with(
        json!({"url": "http://localhost/api/webhooks/1/abc"}),
        transport.clone(),
    );

    notifier
        .notify(&group(vec![alert("val1", "annv1")]), &CancellationToken::new())
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, reqwest::Method::POST);
    assert_eq!(sent[0].content_type, "application/json");
    assert_eq!(sent[0].url.expose(), "http://localhost/api/webhooks/1/abc");

    let body = body_json(&sent[0]);
    assert_eq!(body["username"], "Grafana");
    assert_eq!(body["embeds"][0]["title"], "[FIRING:1]  (val1)");
    assert_eq!(body["embeds"][0]["color"], 14037554);
}

#[tokio::test]
async fn notify_does_not_send_when_template_fails() {
    let transport = Arc::new(RecordingTransport::default());
    let notifier = notifier_with(
        json!({"url": "http://localhost", "message": "{{ status }"}),
        transport.clone(),
    );

    let err = notifier
        .notify(&group(vec![alert("val1", "annv1")]), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, NotifyError::Template { .. }));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn notify_reports_transport_failure() {
    let transport = Arc::new(RecordingTransport::failing(500));
    let notifier = notifier_with(json!({"url": "http://localhost"}), transport.clone());

    let err = notifier
        .notify(&group(vec![alert("val1", "annv1")]), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NotifyError::Delivery(TransportError::Status { status: 500 })
    ));
    assert_eq!(err.kind(), "delivery");
    // single attempt, no retry
    assert_eq!(transport.sent().len(), 1);
}

#[tokio::test]
async fn cancelled_notify_is_a_delivery_failure() {
    let notifier = notifier_with(json!({"url": "http://localhost"}), Arc::new(StalledTransport));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = notifier
        .notify(&group(vec![alert("val1", "annv1")]), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, NotifyError::Delivery(TransportError::Cancelled)));
}

#[tokio::test]
async fn cancel_during_delivery_abandons_request() {
    let notifier = notifier_with(json!({"url": "http://localhost"}), Arc::new(StalledTransport));
    let cancel = CancellationToken::new();
    let g = group(vec![alert("val1", "annv1")]);

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = notifier.notify(&g, &cancel).await.unwrap_err();
    assert!(matches!(err, NotifyError::Delivery(TransportError::Cancelled)));
}

// ============================================================
// Channel trait
// ============================================================

#[test]
fn should_notify_on_resolve_follows_setting() {
    let transport: Arc<dyn WebhookTransport> = Arc::new(RecordingTransport::default());
    let enabled = notifier_with(json!({"url": "http://localhost"}), transport.clone());
    assert!(enabled.should_notify_on_resolve());

    let model = NotificationChannelConfig::discord(
        "quiet",
        Some(json!({"url": "http://localhost"})),
    )
    .with_disable_resolve_message(true);
    let disabled = DiscordNotifier::new(
        "quiet",
        DiscordConfig::from_channel_config(&model).unwrap(),
        Arc::new(TemplateSet::default()),
        transport,
    );
    assert!(!disabled.should_notify_on_resolve());
}

#[test]
fn channel_identity() {
    let notifier = notifier_with(
        json!({"url": "http://localhost"}),
        Arc::new(RecordingTransport::default()),
    );
    assert_eq!(notifier.name(), "discord_testing");
    assert_eq!(notifier.channel_type(), "discord");

    let channel: Arc<dyn NotificationChannel> = Arc::new(notifier);
    let debug = format!("{:?}", channel);
    assert!(debug.contains("discord_testing"));
}

#[test]
fn debug_output_redacts_webhook_url() {
    let notifier = notifier_with(
        json!({"url": "https://discord.com/api/webhooks/1/secret-token"}),
        Arc::new(RecordingTransport::default()),
    );
    let debug = format!("{:?}", notifier);
    assert!(!debug.contains("secret-token"));
}
