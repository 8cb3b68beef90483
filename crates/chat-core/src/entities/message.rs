//! Message entity - represents a chat message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ConversationId, MessageId, UserId};

/// Maximum message content length in characters
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Message kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
    Link,
    System,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::File => "FILE",
            Self::Link => "LINK",
            Self::System => "SYSTEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(Self::Text),
            "IMAGE" => Some(Self::Image),
            "FILE" => Some(Self::File),
            "LINK" => Some(Self::Link),
            "SYSTEM" => Some(Self::System),
            _ => None,
        }
    }
}

/// Message entity
///
/// Soft-deleted messages keep their row and position; only the content is hidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    pub kind: MessageKind,
    pub media_ref: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub reply_to: Option<MessageId>,
    pub thread_root: Option<MessageId>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub is_system: bool,
    /// Present in the schema, never used for encryption; content is plaintext
    pub encryption_key_id: Option<String>,
}

impl Message {
    /// Create a new message with a server-assigned id and timestamp
    pub fn new(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: String,
        kind: MessageKind,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            sender_id,
            content,
            kind,
            media_ref: None,
            metadata: None,
            reply_to: None,
            thread_root: None,
            created_at: Utc::now(),
            edited_at: None,
            deleted_at: None,
            is_system: kind == MessageKind::System,
            encryption_key_id: None,
        }
    }

    /// Create a system notice (joins, leaves) attributed to `actor`
    pub fn system(conversation_id: ConversationId, actor: UserId, content: String) -> Self {
        Self::new(conversation_id, actor, content, MessageKind::System)
    }

    #[inline]
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    /// Edit the message content
    pub fn edit(&mut self, content: String) {
        self.content = content;
        self.edited_at = Some(Utc::now());
    }

    /// Stamp `deleted_at`; returns false if it was already deleted
    pub fn soft_delete(&mut self, at: DateTime<Utc>) -> bool {
        if self.deleted_at.is_some() {
            return false;
        }
        self.deleted_at = Some(at);
        true
    }

    /// Content as shown to readers; hidden once deleted
    pub fn visible_content(&self) -> Option<&str> {
        if self.is_deleted() {
            None
        } else {
            Some(&self.content)
        }
    }

    /// Get a truncated preview of the message (for conversation listings)
    pub fn preview(&self, max_len: usize) -> &str {
        let Some(content) = self.visible_content() else {
            return "";
        };
        if content.len() <= max_len {
            content
        } else {
            let mut end = max_len;
            while !content.is_char_boundary(end) && end > 0 {
                end -= 1;
            }
            &content[..end]
        }
    }

    /// Check if message content is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}
