//! Discord webhook payload.

use serde::Serialize;

/// Body of a Discord webhook execution.
///
/// Field order matches the serialized output, which is deterministic for
/// identical input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscordPayload {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub embeds: Vec<Embed>,
}

/// Rich embed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub footer: EmbedFooter,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: String,
}
