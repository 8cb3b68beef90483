//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use chat_core::entities::{Message, Participant, Reaction};

use super::responses::{
    LastMessagePreview, MessageResponse, ParticipantResponse, ReactionResponse,
};

/// Characters kept in a conversation list preview
pub const PREVIEW_LENGTH: usize = 120;

impl From<&Message> for MessageResponse {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.visible_content().map(str::to_string),
            kind: message.kind,
            media_ref: message.media_ref.clone().filter(|_| !message.is_deleted()),
            metadata: message.metadata.clone(),
            reply_to: message.reply_to,
            is_system: message.is_system,
            created_at: message.created_at,
            edited_at: message.edited_at,
            deleted_at: message.deleted_at,
        }
    }
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self::from(&message)
    }
}

impl From<&Message> for LastMessagePreview {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender_id: message.sender_id,
            preview: message.preview(PREVIEW_LENGTH).to_string(),
            deleted: message.is_deleted(),
            created_at: message.created_at,
        }
    }
}

impl From<&Participant> for ParticipantResponse {
    fn from(participant: &Participant) -> Self {
        Self {
            conversation_id: participant.conversation_id,
            user_id: participant.user_id,
            role: participant.role,
            joined_at: participant.joined_at,
            last_read_at: participant.last_read_at,
        }
    }
}

impl From<Participant> for ParticipantResponse {
    fn from(participant: Participant) -> Self {
        Self::from(&participant)
    }
}

impl From<Reaction> for ReactionResponse {
    fn from(reaction: Reaction) -> Self {
        Self {
            message_id: reaction.message_id,
            user_id: reaction.user_id,
            emoji: reaction.emoji,
            created_at: reaction.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::{ConversationId, MessageKind, UserId};

    #[test]
    fn test_deleted_message_hides_content_and_media() {
        let mut message = Message::new(
            ConversationId::new(),
            UserId::new(),
            "secret".to_string(),
            MessageKind::Image,
        );
        message.media_ref = Some("media/1.png".to_string());
        message.soft_delete(chrono::Utc::now());

        let response = MessageResponse::from(&message);
        assert!(response.content.is_none());
        assert!(response.media_ref.is_none());
        assert!(response.deleted_at.is_some());

        let preview = LastMessagePreview::from(&message);
        assert!(preview.deleted);
        assert_eq!(preview.preview, "");
    }

    #[test]
    fn test_preview_is_truncated() {
        let message = Message::new(
            ConversationId::new(),
            UserId::new(),
            "a".repeat(500),
            MessageKind::Text,
        );
        assert_eq!(LastMessagePreview::from(&message).preview.len(), PREVIEW_LENGTH);
    }
}
