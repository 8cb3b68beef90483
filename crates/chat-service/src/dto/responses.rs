//! JSON projections of conversations, messages and read state
//!
//! Ids serialize as hyphenated UUID strings.

use chat_core::{
    ConversationId, ConversationKind, MessageId, MessageKind, ParticipantRole, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full conversation projection returned to members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub id: ConversationId,
    pub kind: ConversationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Name, or the posting title when unnamed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_title: Option<String>,
    pub created_by: UserId,
    pub archived: bool,
    pub is_group_like: bool,
    pub participant_count: i32,
    pub participants: Vec<ParticipantResponse>,
    /// Latest page of history, oldest first
    #[serde(default)]
    pub messages: Vec<MessageResponse>,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One row of a user's conversation list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummaryResponse {
    pub id: ConversationId,
    pub kind: ConversationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_title: Option<String>,
    pub archived: bool,
    pub is_group_like: bool,
    /// Other active participants, current user excluded
    pub other_participants: Vec<UserId>,
    pub unread_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessagePreview>,
    pub last_activity_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMessagePreview {
    pub id: MessageId,
    pub sender_id: UserId,
    pub preview: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantResponse {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    /// Hidden once the message is deleted
    pub content: Option<String>,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionResponse {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadStateResponse {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up_to_message_id: Option<MessageId>,
    pub last_read_at: DateTime<Utc>,
    pub unread_count: i32,
}
