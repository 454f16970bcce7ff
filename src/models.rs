use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::message_store::MessageId;

/// Stable identity of a conversation. Backed by a v4 UUID so an id is never reused,
/// even after the conversation it named has been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One history entry handed to a responder: just the role and the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
}

impl From<&Message> for Turn {
    fn from(m: &Message) -> Self {
        Self { role: m.role, content: m.content.clone() }
    }
}

/// Tags carried from the context a conversation was started in. Immutable once the
/// conversation exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTags {
    pub mode: Option<String>,
    pub personality: Option<String>,
}

impl ConversationTags {
    pub fn new(mode: impl Into<String>, personality: impl Into<String>) -> Self {
        Self { mode: Some(mode.into()), personality: Some(personality.into()) }
    }
}

/// Sidebar row for one conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    pub pending: bool,
}

/// Full snapshot of a conversation, as rendered by the chat surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationView {
    pub id: ConversationId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub tags: ConversationTags,
    pub document_context: Option<String>,
    pub pending: bool,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    /// Insertion order, oldest first.
    #[default]
    Created,
    /// Most recently updated first.
    Recent,
}

// ── HTTP payloads ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub message: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
}

impl StartRequest {
    pub fn tags(&self) -> ConversationTags {
        ConversationTags { mode: self.mode.clone(), personality: self.personality.clone() }
    }
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveConversation {
    pub conversation_id: Option<ConversationId>,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub conversation_id: ConversationId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveTab {
    pub tab: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub order: ListOrder,
}
