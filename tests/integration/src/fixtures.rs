//! Request bodies and response shapes for the conversation routes

use chat_core::UserId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CreateConversationBody {
    pub kind: &'static str,
    pub participant_ids: Vec<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CreateConversationBody {
    pub fn post_linked(posting_ref: &str, others: &[UserId]) -> Self {
        Self {
            kind: "POST_LINKED",
            participant_ids: others.to_vec(),
            posting_ref: Some(posting_ref.to_string()),
            name: None,
        }
    }

    pub fn direct(other: UserId) -> Self {
        Self {
            kind: "DIRECT",
            participant_ids: vec![other],
            posting_ref: None,
            name: None,
        }
    }

    pub fn group(name: &str, others: &[UserId]) -> Self {
        Self {
            kind: "GROUP",
            participant_ids: others.to_vec(),
            posting_ref: None,
            name: Some(name.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageBody {
    pub content: String,
}

impl MessageBody {
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantBody {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionBody {
    pub emoji: String,
}

impl ReactionBody {
    pub fn new(emoji: &str) -> Self {
        Self {
            emoji: emoji.to_string(),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ConversationBody {
    pub id: String,
    pub kind: String,
    pub posting_ref: Option<String>,
    pub posting_title: Option<String>,
    pub archived: bool,
    pub participant_count: i32,
}

#[derive(Debug, Deserialize)]
pub struct ConversationSummaryBody {
    pub id: String,
    pub unread_count: i32,
    pub archived: bool,
    pub last_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct MessageView {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: Option<String>,
    pub deleted_at: Option<String>,
    pub edited_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReadStateBody {
    pub unread_count: i32,
}

// ============================================================================
// Paths
// ============================================================================

pub const CONVERSATIONS: &str = "/api/v1/conversations";

pub fn conversation_path(id: &str) -> String {
    format!("{CONVERSATIONS}/{id}")
}

pub fn messages_path(id: &str) -> String {
    format!("{CONVERSATIONS}/{id}/messages")
}

pub fn message_path(id: &str, message_id: &str) -> String {
    format!("{CONVERSATIONS}/{id}/messages/{message_id}")
}

pub fn reactions_path(id: &str, message_id: &str) -> String {
    format!("{CONVERSATIONS}/{id}/messages/{message_id}/reactions")
}
