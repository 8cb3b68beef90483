//! Event payload definitions

use chat_core::{ConversationEvent, UserId};
use chat_service::dto::MessageResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// === Connection Events ===

/// READY event payload
///
/// Sent after a successful Identify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyEvent {
    /// Gateway protocol version
    pub v: i32,

    pub user_id: UserId,

    /// Connection id
    pub session_id: String,

    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl ReadyEvent {
    pub const PROTOCOL_VERSION: i32 = 1;

    #[must_use]
    pub fn new(user_id: UserId, session_id: impl Into<String>, heartbeat_interval: u64) -> Self {
        Self {
            v: Self::PROTOCOL_VERSION,
            user_id,
            session_id: session_id.into(),
            heartbeat_interval,
        }
    }
}

// === Room Events ===

/// `room:joined` / `room:left`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomEvent {
    pub room_id: String,
}

/// `room:rejected`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomRejectedEvent {
    pub room_id: String,
    /// Stable reason code, e.g. `NOT_FOUND`
    pub code: String,
    pub message: String,
}

// === Message Events ===

/// `message:ack`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAckEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    pub message: MessageResponse,
}

/// `message:rejected`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRejectedEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    pub room_id: String,
    pub code: String,
    pub message: String,
}

/// Body of the dispatch that carries a conversation event to a room
#[must_use]
pub fn room_event_payload(event: &ConversationEvent) -> Value {
    let payload = match event {
        ConversationEvent::MessageNew(e) => serde_json::to_value(MessageResponse::from(&e.message)),
        ConversationEvent::MessageUpdated(e) => serde_json::to_value(e),
        ConversationEvent::MessageDeleted(e) => serde_json::to_value(e),
        ConversationEvent::ParticipantJoined(e) => serde_json::to_value(e),
        ConversationEvent::ParticipantLeft(e) => serde_json::to_value(e),
        ConversationEvent::ReactionAdded(e) => serde_json::to_value(e),
        ConversationEvent::ReadUpdated(e) => serde_json::to_value(e),
    };

    payload.unwrap_or_else(|e| {
        tracing::warn!(error = %e, event = event.name(), "Failed to encode room event");
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::events::{MessageNewEvent, ParticipantLeftEvent};
    use chat_core::{ConversationId, Message, MessageKind};

    #[test]
    fn test_ready_event() {
        let user = UserId::new();
        let json = serde_json::to_value(ReadyEvent::new(user, "c1", 45_000)).unwrap();
        assert_eq!(json["v"], 1);
        assert_eq!(json["session_id"], "c1");
        assert_eq!(json["user_id"], user.to_string());
    }

    #[test]
    fn test_message_new_payload_is_message_response() {
        let conversation_id = ConversationId::new();
        let sender = UserId::new();
        let message = Message::new(conversation_id, sender, "hello".to_string(), MessageKind::Text);
        let event = ConversationEvent::MessageNew(MessageNewEvent {
            conversation_id,
            message,
        });

        let json = room_event_payload(&event);
        assert_eq!(json["content"], "hello");
        assert_eq!(json["conversation_id"], conversation_id.to_string());
        assert_eq!(json["sender_id"], sender.to_string());
        assert_eq!(json["kind"], "TEXT");
    }

    #[test]
    fn test_other_events_carry_their_fields() {
        let user = UserId::new();
        let event = ConversationEvent::ParticipantLeft(ParticipantLeftEvent {
            conversation_id: ConversationId::new(),
            user_id: user,
            timestamp: chrono::Utc::now(),
        });

        let json = room_event_payload(&event);
        assert_eq!(json["user_id"], user.to_string());
        assert!(json.get("type").is_none());
    }

    #[test]
    fn test_rejection_omits_missing_nonce() {
        let json = serde_json::to_value(MessageRejectedEvent {
            nonce: None,
            room_id: "r".to_string(),
            code: "NOT_FOUND".to_string(),
            message: "Conversation not found".to_string(),
        })
        .unwrap();
        assert!(json.get("nonce").is_none());
        assert_eq!(json["code"], "NOT_FOUND");
    }
}
