//! Conversation and participant database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for conversations table
#[derive(Debug, Clone, FromRow)]
pub struct ConversationModel {
    pub id: Uuid,
    pub kind: String,
    pub name: Option<String>,
    pub posting_ref: Option<String>,
    pub created_by: Uuid,
    pub archived: bool,
    pub participant_key: Option<String>,
    pub participant_count: i32,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Database model for conversation_participants table
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantModel {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub last_read_at: Option<DateTime<Utc>>,
    pub muted: bool,
    pub unread_count: i32,
}

impl ParticipantModel {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}
