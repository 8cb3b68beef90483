//! Gateway event types
//!
//! Names of the dispatches the gateway itself originates. Conversation
//! events keep their own names (`message:new`, `participant:joined`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway-originated dispatch names, sent in the `t` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GatewayEventType {
    /// Sent after a successful Identify
    #[serde(rename = "READY")]
    Ready,
    #[serde(rename = "room:joined")]
    RoomJoined,
    /// Join refused; the connection stays open
    #[serde(rename = "room:rejected")]
    RoomRejected,
    #[serde(rename = "room:left")]
    RoomLeft,
    /// Message persisted; echoes the client nonce
    #[serde(rename = "message:ack")]
    MessageAck,
    #[serde(rename = "message:rejected")]
    MessageRejected,
}

impl GatewayEventType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::RoomJoined => "room:joined",
            Self::RoomRejected => "room:rejected",
            Self::RoomLeft => "room:left",
            Self::MessageAck => "message:ack",
            Self::MessageRejected => "message:rejected",
        }
    }

    /// Parse from the wire name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "READY" => Some(Self::Ready),
            "room:joined" => Some(Self::RoomJoined),
            "room:rejected" => Some(Self::RoomRejected),
            "room:left" => Some(Self::RoomLeft),
            "message:ack" => Some(Self::MessageAck),
            "message:rejected" => Some(Self::MessageRejected),
            _ => None,
        }
    }
}

impl fmt::Display for GatewayEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for event in [
            GatewayEventType::Ready,
            GatewayEventType::RoomJoined,
            GatewayEventType::RoomRejected,
            GatewayEventType::RoomLeft,
            GatewayEventType::MessageAck,
            GatewayEventType::MessageRejected,
        ] {
            let json = serde_json::to_string(&event).unwrap();
            assert_eq!(json, format!("\"{}\"", event.as_str()));
            assert_eq!(GatewayEventType::parse(event.as_str()), Some(event));
        }
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(GatewayEventType::parse("TYPING_START"), None);
        assert_eq!(GatewayEventType::parse("message:new"), None);
    }
}
