use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{Message, MessageRole};

/// Per-conversation message id. Allocated from a counter owned by the store, so ids
/// increase with insertion order and are never handed out twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Earliest message with the given role in an ordered history.
pub fn first_by_role(messages: &[Message], role: MessageRole) -> Option<&Message> {
    messages.iter().find(|m| m.role == role)
}

/// Append-only message log of a single conversation.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    next_id: u64,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message stamped with a fresh id and the current time.
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) -> Message {
        self.next_id += 1;
        let message = Message {
            id: MessageId(self.next_id),
            role,
            content: content.into(),
            created_at: Utc::now(),
        };
        self.messages.push(message.clone());
        message
    }

    /// Messages in insertion order. Call again to restart.
    pub fn all(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn first_by_role(&self, role: MessageRole) -> Option<&Message> {
        first_by_role(&self.messages, role)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
