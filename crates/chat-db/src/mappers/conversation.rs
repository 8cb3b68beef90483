//! Conversation and participant model -> entity mappers

use chat_core::entities::{Conversation, ConversationKind, Participant, ParticipantRole};
use chat_core::value_objects::{ConversationId, ParticipantKey, UserId};

use crate::models::{ConversationModel, ParticipantModel};

/// Convert ConversationModel to Conversation entity
impl From<ConversationModel> for Conversation {
    fn from(model: ConversationModel) -> Self {
        Conversation {
            id: ConversationId::from_uuid(model.id),
            // the CHECK constraint keeps unknown kinds out of the table
            kind: ConversationKind::parse(&model.kind).unwrap_or(ConversationKind::Direct),
            name: model.name,
            posting_ref: model.posting_ref,
            created_by: UserId::from_uuid(model.created_by),
            archived: model.archived,
            participant_key: model.participant_key.map(ParticipantKey::from_raw),
            participant_count: model.participant_count,
            last_activity_at: model.last_activity_at,
            created_at: model.created_at,
        }
    }
}

/// Convert ParticipantModel to Participant entity
impl From<ParticipantModel> for Participant {
    fn from(model: ParticipantModel) -> Self {
        Participant {
            conversation_id: ConversationId::from_uuid(model.conversation_id),
            user_id: UserId::from_uuid(model.user_id),
            role: ParticipantRole::parse(&model.role).unwrap_or_default(),
            joined_at: model.joined_at,
            left_at: model.left_at,
            last_read_at: model.last_read_at,
            muted: model.muted,
            unread_count: model.unread_count,
        }
    }
}
