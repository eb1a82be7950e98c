//! Alert group data handed over by the routing layer for one notification cycle.
//!
//! The routing layer decides which alerts are bundled together; this module
//! only describes the shape of that bundle and derives the aggregate values
//! (status, common labels) that templates and the color mapping need.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label or annotation set. Keys are unique and iterate in sorted order.
pub type LabelSet = BTreeMap<String, String>;

/// Lifecycle state of a single alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    Firing,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Firing => "firing",
            AlertStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single alert instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(default)]
    pub status: AlertStatus,
    #[serde(default)]
    pub labels: LabelSet,
    #[serde(default)]
    pub annotations: LabelSet,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub generator_url: String,
    #[serde(default)]
    pub fingerprint: String,
}

impl AlertRecord {
    /// Creates a firing alert with the given labels.
    pub fn firing<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: collect_labels(labels),
            ..Self::default()
        }
    }

    /// Sets the annotations.
    #[must_use]
    pub fn with_annotations<I, K, V>(mut self, annotations: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.annotations = collect_labels(annotations);
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: AlertStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_firing(&self) -> bool {
        self.status == AlertStatus::Firing
    }
}

/// Aggregate status of an alert group.
///
/// Unrecognised status strings deserialize to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Firing,
    Resolved,
    Mixed,
    #[serde(other)]
    Unknown,
}

impl GroupStatus {
    /// Derives the aggregate status from individual alert states.
    ///
    /// An empty group counts as resolved.
    pub fn from_alerts(alerts: &[AlertRecord]) -> Self {
        let firing = alerts.iter().filter(|a| a.is_firing()).count();
        match firing {
            0 => GroupStatus::Resolved,
            n if n == alerts.len() => GroupStatus::Firing,
            _ => GroupStatus::Mixed,
        }
    }

    /// Status string exposed to templates.
    ///
    /// A group with at least one firing alert is reported as `firing`.
    pub fn template_status(&self) -> &'static str {
        match self {
            GroupStatus::Firing | GroupStatus::Mixed => "firing",
            GroupStatus::Resolved => "resolved",
            GroupStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupStatus::Firing => "firing",
            GroupStatus::Resolved => "resolved",
            GroupStatus::Mixed => "mixed",
            GroupStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A batch of related alerts delivered together in one notification cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertGroup {
    pub alerts: Vec<AlertRecord>,
    pub status: GroupStatus,
    #[serde(default)]
    pub group_key: String,
    #[serde(default)]
    pub group_labels: LabelSet,
    #[serde(default)]
    pub external_url: String,
    #[serde(default)]
    pub receiver: String,
}

impl AlertGroup {
    /// Creates a group whose status is derived from its alerts.
    pub fn new(alerts: Vec<AlertRecord>, external_url: impl Into<String>) -> Self {
        let status = GroupStatus::from_alerts(&alerts);
        Self {
            alerts,
            status,
            group_key: String::new(),
            group_labels: LabelSet::new(),
            external_url: external_url.into(),
            receiver: String::new(),
        }
    }

    #[must_use]
    pub fn with_group_key(mut self, key: impl Into<String>) -> Self {
        self.group_key = key.into();
        self
    }

    #[must_use]
    pub fn with_group_labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.group_labels = collect_labels(labels);
        self
    }

    #[must_use]
    pub fn with_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = receiver.into();
        self
    }

    pub fn firing(&self) -> impl Iterator<Item = &AlertRecord> {
        self.alerts.iter().filter(|a| a.is_firing())
    }

    pub fn resolved(&self) -> impl Iterator<Item = &AlertRecord> {
        self.alerts.iter().filter(|a| !a.is_firing())
    }

    /// True when the group reports as resolved.
    ///
    /// Reads the same `status` that drives the color and title, so a
    /// group marked resolved counts as resolved whatever its alerts say.
    pub fn is_resolved_only(&self) -> bool {
        !self.alerts.is_empty() && self.status == GroupStatus::Resolved
    }

    /// Labels shared with identical values by every alert.
    pub fn common_labels(&self) -> LabelSet {
        common_entries(self.alerts.iter().map(|a| &a.labels))
    }

    /// Annotations shared with identical values by every alert.
    pub fn common_annotations(&self) -> LabelSet {
        common_entries(self.alerts.iter().map(|a| &a.annotations))
    }
}

fn common_entries<'a>(mut sets: impl Iterator<Item = &'a LabelSet>) -> LabelSet {
    let Some(first) = sets.next() else {
        return LabelSet::new();
    };
    let mut common = first.clone();
    for set in sets {
        common.retain(|k, v| set.get(k) == Some(v));
    }
    common
}

fn collect_labels<I, K, V>(labels: I) -> LabelSet
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    labels
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
