//! Conversation events - emitted after a change is persisted
//!
//! Every event is scoped to one conversation room. The gateway fans each
//! event out to the room's live connections, minus the actor's own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{Message, ParticipantRole};
use crate::value_objects::{ConversationId, MessageId, UserId};

/// All events delivered to conversation rooms
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ConversationEvent {
    #[serde(rename = "message:new")]
    MessageNew(MessageNewEvent),
    #[serde(rename = "message:updated")]
    MessageUpdated(MessageUpdatedEvent),
    #[serde(rename = "message:deleted")]
    MessageDeleted(MessageDeletedEvent),
    #[serde(rename = "participant:joined")]
    ParticipantJoined(ParticipantJoinedEvent),
    #[serde(rename = "participant:left")]
    ParticipantLeft(ParticipantLeftEvent),
    #[serde(rename = "reaction:added")]
    ReactionAdded(ReactionAddedEvent),
    #[serde(rename = "read:updated")]
    ReadUpdated(ReadUpdatedEvent),
}

impl ConversationEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageNew(_) => "message:new",
            Self::MessageUpdated(_) => "message:updated",
            Self::MessageDeleted(_) => "message:deleted",
            Self::ParticipantJoined(_) => "participant:joined",
            Self::ParticipantLeft(_) => "participant:left",
            Self::ReactionAdded(_) => "reaction:added",
            Self::ReadUpdated(_) => "read:updated",
        }
    }

    pub fn conversation_id(&self) -> ConversationId {
        match self {
            Self::MessageNew(e) => e.conversation_id,
            Self::MessageUpdated(e) => e.conversation_id,
            Self::MessageDeleted(e) => e.conversation_id,
            Self::ParticipantJoined(e) => e.conversation_id,
            Self::ParticipantLeft(e) => e.conversation_id,
            Self::ReactionAdded(e) => e.conversation_id,
            Self::ReadUpdated(e) => e.conversation_id,
        }
    }

    /// Room key for this event: the conversation id, verbatim
    pub fn room(&self) -> String {
        self.conversation_id().to_string()
    }

    /// User whose own connections are excluded from delivery
    pub fn actor(&self) -> UserId {
        match self {
            Self::MessageNew(e) => e.message.sender_id,
            Self::MessageUpdated(e) => e.sender_id,
            Self::MessageDeleted(e) => e.sender_id,
            Self::ParticipantJoined(e) => e.added_by,
            Self::ParticipantLeft(e) => e.user_id,
            Self::ReactionAdded(e) => e.user_id,
            Self::ReadUpdated(e) => e.user_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MessageNew(e) => e.message.created_at,
            Self::MessageUpdated(e) => e.edited_at,
            Self::MessageDeleted(e) => e.deleted_at,
            Self::ParticipantJoined(e) => e.timestamp,
            Self::ParticipantLeft(e) => e.timestamp,
            Self::ReactionAdded(e) => e.timestamp,
            Self::ReadUpdated(e) => e.read_at,
        }
    }
}

// ============================================================================
// Event Structs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageNewEvent {
    pub conversation_id: ConversationId,
    pub message: Message,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageUpdatedEvent {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub content: String,
    pub edited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDeletedEvent {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantJoinedEvent {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub added_by: UserId,
    pub role: ParticipantRole,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantLeftEvent {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionAddedEvent {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadUpdatedEvent {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub up_to_message_id: Option<MessageId>,
    pub read_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::MessageKind;

    #[test]
    fn test_message_new_routing() {
        let conversation_id = ConversationId::new();
        let sender = UserId::new();
        let message = Message::new(conversation_id, sender, "Hi".to_string(), MessageKind::Text);
        let event = ConversationEvent::MessageNew(MessageNewEvent {
            conversation_id,
            message,
        });

        assert_eq!(event.name(), "message:new");
        assert_eq!(event.room(), conversation_id.to_string());
        assert_eq!(event.actor(), sender);
    }

    #[test]
    fn test_serde_tag_is_wire_name() {
        let event = ConversationEvent::ParticipantLeft(ParticipantLeftEvent {
            conversation_id: ConversationId::new(),
            user_id: UserId::new(),
            timestamp: Utc::now(),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "participant:left");

        let back: ConversationEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.name(), "participant:left");
    }

    #[test]
    fn test_joined_actor_is_adder() {
        let admin = UserId::new();
        let event = ConversationEvent::ParticipantJoined(ParticipantJoinedEvent {
            conversation_id: ConversationId::new(),
            user_id: UserId::new(),
            added_by: admin,
            role: ParticipantRole::Member,
            timestamp: Utc::now(),
        });
        assert_eq!(event.actor(), admin);
    }
}
