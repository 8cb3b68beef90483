//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use chat_core::entities::{MAX_CONVERSATION_NAME_LENGTH, MAX_MESSAGE_LENGTH};
use chat_core::{ConversationFilter, ConversationKind, MessageId, MessageKind, UserId};
use serde::Deserialize;
use validator::Validate;

// ============================================================================
// Conversation Requests
// ============================================================================

/// Create conversation request
///
/// `participant_ids` lists the other participants; the requester is always
/// added and is ignored if present in the list.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateConversationRequest {
    pub kind: ConversationKind,

    #[serde(default)]
    pub participant_ids: Vec<UserId>,

    #[validate(length(min = 1, max = 128, message = "Posting reference must be 1-128 characters"))]
    pub posting_ref: Option<String>,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

impl CreateConversationRequest {
    pub fn direct(other: UserId, posting_ref: Option<String>) -> Self {
        Self {
            kind: ConversationKind::Direct,
            participant_ids: vec![other],
            posting_ref,
            name: None,
        }
    }

    pub fn post_linked(posting_ref: impl Into<String>, participant_ids: Vec<UserId>) -> Self {
        Self {
            kind: ConversationKind::PostLinked,
            participant_ids,
            posting_ref: Some(posting_ref.into()),
            name: None,
        }
    }

    pub fn group(name: Option<String>, posting_ref: Option<String>, participant_ids: Vec<UserId>) -> Self {
        Self {
            kind: ConversationKind::Group,
            participant_ids,
            posting_ref,
            name,
        }
    }

    /// Trimmed name, `None` if blank
    pub fn trimmed_name(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| n.chars().take(MAX_CONVERSATION_NAME_LENGTH).collect())
    }
}

/// Add participant request
#[derive(Debug, Clone, Deserialize)]
pub struct AddParticipantRequest {
    pub user_id: UserId,
}

/// Conversation listing filters (query string)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListConversationsQuery {
    #[serde(default)]
    pub include_archived: bool,

    pub kind: Option<ConversationKind>,

    pub posting_ref: Option<String>,

    #[validate(range(min = 1, max = 100, message = "Limit must be 1-100"))]
    pub limit: Option<i64>,
}

impl From<ListConversationsQuery> for ConversationFilter {
    fn from(query: ListConversationsQuery) -> Self {
        let defaults = ConversationFilter::default();
        Self {
            include_archived: query.include_archived,
            kind: query.kind,
            posting_ref: query.posting_ref,
            limit: query.limit.unwrap_or(defaults.limit),
        }
    }
}

/// Lookup of the live 1:1 thread between the caller and `user_id` about a posting
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DirectConversationQuery {
    #[validate(length(min = 1, max = 255, message = "Posting reference must be 1-255 characters"))]
    pub posting_ref: String,

    pub user_id: UserId,
}

// ============================================================================
// Message Requests
// ============================================================================

/// Append message request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[serde(default)]
    #[validate(length(max = 4000, message = "Message content must be at most 4000 characters"))]
    pub content: String,

    #[serde(default)]
    pub kind: MessageKind,

    pub reply_to: Option<MessageId>,

    #[validate(length(max = 512, message = "Media reference must be at most 512 characters"))]
    pub media_ref: Option<String>,

    pub metadata: Option<serde_json::Value>,
}

impl CreateMessageRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Rules the derive cannot express
    pub fn check_content(&self) -> Result<(), chat_core::DomainError> {
        if self.content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(chat_core::DomainError::ContentTooLong {
                max: MAX_MESSAGE_LENGTH,
            });
        }
        if self.kind == MessageKind::System {
            return Err(chat_core::DomainError::ValidationError(
                "System messages cannot be sent by clients".to_string(),
            ));
        }
        if self.kind == MessageKind::Text && self.content.trim().is_empty() {
            return Err(chat_core::DomainError::ValidationError(
                "Text messages cannot be empty".to_string(),
            ));
        }
        if matches!(self.kind, MessageKind::Image | MessageKind::File) && self.media_ref.is_none() {
            return Err(chat_core::DomainError::ValidationError(
                "Media messages require a media reference".to_string(),
            ));
        }
        Ok(())
    }
}

/// Edit message request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMessageRequest {
    #[validate(length(min = 1, max = 4000, message = "Message content must be 1-4000 characters"))]
    pub content: String,
}

/// Message history paging (query string)
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListMessagesQuery {
    pub before: Option<MessageId>,

    #[validate(range(min = 1, max = 100, message = "Limit must be 1-100"))]
    pub limit: Option<i64>,
}

/// Mark read request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkReadRequest {
    pub up_to_message_id: Option<MessageId>,
}

/// Add reaction request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddReactionRequest {
    #[validate(length(min = 1, max = 32, message = "Emoji must be 1-32 characters"))]
    pub emoji: String,
}
