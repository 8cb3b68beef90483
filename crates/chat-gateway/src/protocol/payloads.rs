//! Client payload definitions
//!
//! Payload structures for client-to-server frames, plus Hello.

use chat_core::{MessageId, MessageKind};
use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

impl HelloPayload {
    /// Default heartbeat interval (45 seconds)
    pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 45_000;

    #[must_use]
    pub fn new() -> Self {
        Self {
            heartbeat_interval: Self::DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_interval(heartbeat_interval: u64) -> Self {
        Self { heartbeat_interval }
    }
}

impl Default for HelloPayload {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Bearer token, with or without the `Bearer ` prefix
    pub token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IdentifyProperties>,
}

impl IdentifyPayload {
    /// The raw token with any `Bearer ` prefix removed
    #[must_use]
    pub fn bare_token(&self) -> &str {
        self.token.strip_prefix("Bearer ").unwrap_or(&self.token).trim()
    }
}

/// Client connection properties, logged on identify
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifyProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,

    /// Browser or client name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// Payload for op 3 (Join Room) and op 4 (Leave Room)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPayload {
    /// Conversation id, kept as the exact string the client sent
    pub room_id: String,
}

impl RoomPayload {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
        }
    }
}

/// Payload for op 6 (Send Message)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessagePayload {
    pub room_id: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub kind: MessageKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,

    /// Client correlation id, echoed in the ack or rejection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl SendMessagePayload {
    pub fn text(room_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            content: content.into(),
            kind: MessageKind::default(),
            reply_to: None,
            media_ref: None,
            nonce: None,
        }
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_payload() {
        assert_eq!(HelloPayload::new().heartbeat_interval, 45_000);
        assert_eq!(HelloPayload::with_interval(30_000).heartbeat_interval, 30_000);
    }

    #[test]
    fn test_bare_token_strips_bearer() {
        let with_prefix = IdentifyPayload {
            token: "Bearer abc.def".to_string(),
            properties: None,
        };
        let without = IdentifyPayload {
            token: "abc.def".to_string(),
            properties: None,
        };
        assert_eq!(with_prefix.bare_token(), "abc.def");
        assert_eq!(without.bare_token(), "abc.def");
    }

    #[test]
    fn test_room_id_is_kept_verbatim() {
        let json = r#"{"room_id":"6f51ad19-f0e6-4b95-b0b3-0f795c229461"}"#;
        let payload: RoomPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.room_id, "6f51ad19-f0e6-4b95-b0b3-0f795c229461");
    }

    #[test]
    fn test_send_message_defaults() {
        let json = r#"{"room_id":"r","content":"Hi","nonce":"n-1"}"#;
        let payload: SendMessagePayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.kind, MessageKind::Text);
        assert_eq!(payload.nonce.as_deref(), Some("n-1"));
        assert!(payload.reply_to.is_none());
    }
}
