//! Message templating for channel payloads.
//!
//! Templates use Jinja2 syntax powered by minijinja. A [`TemplateSet`] holds
//! the built-in named templates (`default.title`, `default.message`) plus any
//! user-defined ones, so free-form templates can pull them in with
//! `{% include "name" %}`.
//!
//! All expansions that make up one payload share a single [`RenderPass`]. The
//! pass keeps the first failure, turns later renders into no-ops, and reports
//! the failure once the payload is assembled:
//!
//! ```text
//! AlertGroup -> TemplateData -> RenderPass::render (xN) -> RenderPass::finish
//! ```
//!
//! # Example
//!
//! ```
//! use discord_notifier::alert::{AlertGroup, AlertRecord};
//! use discord_notifier::template::{RenderPass, TemplateSet};
//!
//! let templates = TemplateSet::default();
//! let group = AlertGroup::new(
//!     vec![AlertRecord::firing([("alertname", "HighCPU")])],
//!     "http://localhost",
//! );
//!
//! let mut pass = RenderPass::new(&templates, &group);
//! let text = pass.render("content", "{{ alerts | length }} alert(s) {{ status }}");
//! assert!(pass.finish().is_ok());
//! assert_eq!(text, "1 alert(s) firing");
//! ```

use crate::alert::{AlertGroup, AlertRecord, AlertStatus};
use crate::error::{ConfigError, TemplateError};
use minijinja::value::{Enumerator, Object, ObjectRepr};
use minijinja::{Environment, Value, context};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name of the built-in title template.
pub const DEFAULT_TITLE_TEMPLATE: &str = "default.title";

/// Name of the built-in message template.
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "default.message";

/// Template text that expands the built-in title.
pub const DEFAULT_TITLE_REF: &str = r#"{% include "default.title" %}"#;

/// Template text that expands the built-in message.
pub const DEFAULT_MESSAGE_REF: &str = r#"{% include "default.message" %}"#;

/// `[FIRING:2] <group label values> (<common labels outside the group labels>)`
const DEFAULT_TITLE_SOURCE: &str = concat!(
    r#"[{{ status | upper }}{% if status == "firing" %}:{{ alerts.firing | length }}{% endif %}] "#,
    r#"{% for name, value in group_labels | dictsort %}{% if not loop.first %} {% endif %}{{ value }}{% endfor %} "#,
    r#"{% if common_labels | length > group_labels | length %}("#,
    r#"{% for name, value in common_labels | without(group_labels) | dictsort %}{% if not loop.first %} {% endif %}{{ value }}{% endfor %}"#,
    r#"){% endif %}"#,
);

const DEFAULT_MESSAGE_SOURCE: &str = r#"{% macro alert_list(items) %}{% for alert in items %}{% if not loop.first %}
{% endif %}Labels:
{% for name, value in alert.labels | dictsort %} - {{ name }} = {{ value }}
{% endfor %}Annotations:
{% for name, value in alert.annotations | dictsort %} - {{ name }} = {{ value }}
{% endfor %}Source: {{ alert.generator_url }}
{% endfor %}{% endmacro -%}
{% if alerts.firing | length > 0 %}**Firing**
{{ alert_list(alerts.firing) }}{% if alerts.resolved | length > 0 %}
{% endif %}{% endif %}{% if alerts.resolved | length > 0 %}**Resolved**
{{ alert_list(alerts.resolved) }}{% endif %}"#;

/// Named templates available to every render, backed by one shared
/// minijinja environment.
///
/// The set is immutable once built and can be shared across concurrent
/// notification cycles behind an `Arc`.
pub struct TemplateSet {
    env: Environment<'static>,
    names: Vec<String>,
}

impl TemplateSet {
    /// Builds a set with the built-in templates plus `custom` ones.
    ///
    /// Every custom template is parsed up front so syntax errors surface as
    /// configuration errors. A custom template may replace a built-in one
    /// by using its name.
    pub fn with_templates(custom: BTreeMap<String, String>) -> Result<Self, ConfigError> {
        for (name, source) in &custom {
            validate_template(name, source)?;
        }
        Ok(Self::build(custom))
    }

    fn build(custom: BTreeMap<String, String>) -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(
            DEFAULT_TITLE_TEMPLATE.to_string(),
            DEFAULT_TITLE_SOURCE.to_string(),
        );
        sources.insert(
            DEFAULT_MESSAGE_TEMPLATE.to_string(),
            DEFAULT_MESSAGE_SOURCE.to_string(),
        );
        sources.extend(custom);

        let names = sources.keys().cloned().collect();
        let sources = Arc::new(sources);

        let mut env = Environment::new();
        env.add_filter("without", without);
        env.set_loader(move |name| Ok(sources.get(name).cloned()));

        Self { env, names }
    }

    /// Names of every template that can be included.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Renders free-form template text against the alert data.
    pub fn render(&self, source: &str, data: &TemplateData) -> Result<String, minijinja::Error> {
        self.env.render_str(source, &data.ctx)
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::build(BTreeMap::new())
    }
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("templates", &self.names)
            .finish()
    }
}

/// Parses a template without rendering it.
pub fn validate_template(name: &str, source: &str) -> Result<(), ConfigError> {
    let mut env = Environment::new();
    env.add_template("_validate", source)
        .map_err(|e| ConfigError::InvalidTemplate {
            name: name.to_string(),
            message: e.to_string(),
        })?;
    Ok(())
}

/// `labels | without(other)`: drops every key of `labels` present in `other`.
fn without(labels: Value, other: Value) -> Result<Value, minijinja::Error> {
    let mut kept = BTreeMap::new();
    for key in labels.try_iter()? {
        if other.get_item(&key)?.is_undefined() {
            let value = labels.get_item(&key)?;
            kept.insert(key.to_string(), value);
        }
    }
    Ok(Value::from_serialize(&kept))
}

/// Template context built from one alert group.
///
/// Exposes `receiver`, `status`, `alerts` (with `.firing` and `.resolved`),
/// `group_labels`, `common_labels`, `common_annotations`, `external_url` and
/// `group_key`.
#[derive(Debug, Clone)]
pub struct TemplateData {
    ctx: Value,
}

impl TemplateData {
    pub fn new(group: &AlertGroup) -> Self {
        let ctx = context! {
            receiver => &group.receiver,
            status => group.status.template_status(),
            alerts => Value::from_object(AlertList::new(&group.alerts)),
            group_labels => &group.group_labels,
            common_labels => group.common_labels(),
            common_annotations => group.common_annotations(),
            external_url => &group.external_url,
            group_key => &group.group_key,
        };
        Self { ctx }
    }
}

/// Alert sequence that also answers `.firing` and `.resolved`.
#[derive(Debug)]
struct AlertList {
    alerts: Vec<(AlertStatus, Value)>,
}

impl AlertList {
    fn new(alerts: &[AlertRecord]) -> Self {
        Self {
            alerts: alerts
                .iter()
                .map(|a| (a.status, Value::from_serialize(a)))
                .collect(),
        }
    }

    fn only(&self, status: AlertStatus) -> Value {
        Value::from_object(AlertList {
            alerts: self
                .alerts
                .iter()
                .filter(|(s, _)| *s == status)
                .cloned()
                .collect(),
        })
    }
}

impl Object for AlertList {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Seq
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str() {
            Some("firing") => Some(self.only(AlertStatus::Firing)),
            Some("resolved") => Some(self.only(AlertStatus::Resolved)),
            _ => {
                let idx = key.as_usize()?;
                self.alerts.get(idx).map(|(_, v)| v.clone())
            }
        }
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Seq(self.alerts.len())
    }
}

/// One render pass: every template expansion needed for a single payload.
///
/// The first failure is kept; once a render has failed, later calls return
/// an empty string without touching the engine. Call [`RenderPass::finish`]
/// after the payload is assembled to learn whether it may be sent.
///
/// A pass is created per build and never shared between cycles.
#[derive(Debug)]
pub struct RenderPass<'a> {
    templates: &'a TemplateSet,
    data: TemplateData,
    error: Option<TemplateError>,
}

impl<'a> RenderPass<'a> {
    pub fn new(templates: &'a TemplateSet, group: &AlertGroup) -> Self {
        Self {
            templates,
            data: TemplateData::new(group),
            error: None,
        }
    }

    /// Expands `source` for the payload field `field`.
    pub fn render(&mut self, field: &str, source: &str) -> String {
        if self.error.is_some() {
            return String::new();
        }
        match self.templates.render(source, &self.data) {
            Ok(text) => text,
            Err(e) => {
                tracing::trace!(field = %field, error = %e, "Template render failed");
                self.error = Some(TemplateError {
                    field: field.to_string(),
                    message: e.to_string(),
                });
                String::new()
            }
        }
    }

    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Ends the pass, returning the first failure if any.
    pub fn finish(self) -> Result<(), TemplateError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
