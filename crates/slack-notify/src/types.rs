use serde::{Deserialize, Serialize};

// ─── Block Kit ────────────────────────────────────────────────────────────

/// Text object used inside blocks and elements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    Mrkdwn { text: String },
    PlainText { text: String },
}

impl Text {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Text::Mrkdwn { text: text.into() }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Text::PlainText { text: text.into() }
    }
}

/// The subset of Block Kit layout blocks this crate sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { text: Text },
    Actions { elements: Vec<Button> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

/// Interactive button element. Slack echoes `action_id` and `value` back in
/// the interaction callback.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename = "button")]
pub struct Button {
    pub text: Text,
    pub action_id: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
}

impl Button {
    pub fn new(label: impl Into<String>, action_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: Text::plain(label),
            action_id: action_id.into(),
            value: value.into(),
            style: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }
}

// ─── Web API requests/responses ───────────────────────────────────────────

/// Body of `chat.postMessage`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostMessage {
    pub channel: String,
    /// Fallback for notifications and clients that cannot render blocks.
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

/// Every Web API response carries `ok`; failures add `error`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

/// Message sent to an interaction's `response_url`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResponseMessage {
    pub text: String,
    #[serde(default)]
    pub replace_original: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

impl ResponseMessage {
    pub fn replace(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            replace_original: true,
            blocks: Vec::new(),
        }
    }
}

// ─── Interaction callbacks ────────────────────────────────────────────────

/// Interactivity callback body. Only `block_actions` carries button clicks;
/// other kinds are parsed so they can be acknowledged and ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
}

impl InteractionPayload {
    pub fn is_block_actions(&self) -> bool {
        self.kind == "block_actions"
    }

    /// Best display name for whoever clicked.
    pub fn user_name(&self) -> Option<&str> {
        let user = self.user.as_ref()?;
        user.username
            .as_deref()
            .or(user.name.as_deref())
            .or(Some(user.id.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
}
