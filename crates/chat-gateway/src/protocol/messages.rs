//! Gateway frame format
//!
//! Every frame on the socket is `{op, t, s, d}`.

use super::{CloseCode, HelloPayload, IdentifyPayload, OpCode, RoomPayload, SendMessagePayload};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a client frame asks the gateway to do
#[derive(Debug, Clone)]
pub enum ClientCommand {
    /// Last dispatch sequence the client saw
    Heartbeat(Option<u64>),
    Identify(IdentifyPayload),
    JoinRoom(RoomPayload),
    LeaveRoom(RoomPayload),
    SendMessage(SendMessagePayload),
}

impl ClientCommand {
    /// Commands accepted before the connection has identified
    #[must_use]
    pub const fn allowed_before_identify(&self) -> bool {
        matches!(self, Self::Heartbeat(_) | Self::Identify(_))
    }
}

/// Gateway frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: OpCode,

    /// Event name (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Per-connection sequence number (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayMessage {
    // === Server Messages ===

    /// Create a Dispatch message (op=0)
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_type.into()),
            s: Some(sequence),
            d: Some(data),
        }
    }

    /// Dispatch without a sequence; one is stamped per recipient on send
    #[must_use]
    pub fn event(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            op: OpCode::Dispatch,
            t: Some(event_type.into()),
            s: None,
            d: Some(data),
        }
    }

    /// Create a Hello message (op=10)
    #[must_use]
    pub fn hello(payload: HelloPayload) -> Self {
        Self {
            op: OpCode::Hello,
            t: None,
            s: None,
            d: serde_json::to_value(payload).ok(),
        }
    }

    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self::bare(OpCode::HeartbeatAck)
    }

    /// Ask the client to drop and re-establish the connection (op=7)
    #[must_use]
    pub fn reconnect() -> Self {
        Self::bare(OpCode::Reconnect)
    }

    // === Client Messages ===

    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self {
            op: OpCode::Heartbeat,
            t: None,
            s: None,
            d: last_sequence.map(|s| Value::Number(s.into())),
        }
    }

    #[must_use]
    pub fn identify(token: impl Into<String>) -> Self {
        Self::with_payload(
            OpCode::Identify,
            &IdentifyPayload {
                token: token.into(),
                properties: None,
            },
        )
    }

    #[must_use]
    pub fn join_room(room_id: impl Into<String>) -> Self {
        Self::with_payload(OpCode::JoinRoom, &RoomPayload::new(room_id))
    }

    #[must_use]
    pub fn leave_room(room_id: impl Into<String>) -> Self {
        Self::with_payload(OpCode::LeaveRoom, &RoomPayload::new(room_id))
    }

    #[must_use]
    pub fn send_message(payload: &SendMessagePayload) -> Self {
        Self::with_payload(OpCode::SendMessage, payload)
    }

    fn bare(op: OpCode) -> Self {
        Self {
            op,
            t: None,
            s: None,
            d: None,
        }
    }

    fn with_payload<T: Serialize>(op: OpCode, payload: &T) -> Self {
        Self {
            op,
            t: None,
            s: None,
            d: serde_json::to_value(payload).ok(),
        }
    }

    /// Decode a client frame into the command it carries
    ///
    /// Server-only ops fail with `UnknownOpcode`, a payload of the wrong
    /// shape with `DecodeError`.
    pub fn command(&self) -> Result<ClientCommand, CloseCode> {
        match self.op {
            OpCode::Heartbeat => match &self.d {
                None | Some(Value::Null) => Ok(ClientCommand::Heartbeat(None)),
                Some(d) => d.as_u64().map(|s| ClientCommand::Heartbeat(Some(s))).ok_or(CloseCode::DecodeError),
            },
            OpCode::Identify => self.decode().map(ClientCommand::Identify),
            OpCode::JoinRoom => self.decode().map(ClientCommand::JoinRoom),
            OpCode::LeaveRoom => self.decode().map(ClientCommand::LeaveRoom),
            OpCode::SendMessage => self.decode().map(ClientCommand::SendMessage),
            OpCode::Dispatch | OpCode::Reconnect | OpCode::Hello | OpCode::HeartbeatAck => Err(CloseCode::UnknownOpcode),
        }
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T, CloseCode> {
        self.data().ok_or(CloseCode::DecodeError)
    }

    /// Deserialize the `d` payload
    pub fn data<T: DeserializeOwned>(&self) -> Option<T> {
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// True for a dispatch named `event_type`
    #[must_use]
    pub fn is_event(&self, event_type: &str) -> bool {
        self.op == OpCode::Dispatch && self.t.as_deref() == Some(event_type)
    }

    // === Utilities ===

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn close_frame(code: CloseCode) -> (u16, String) {
        (code.as_u16(), code.description().to_string())
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayMessage(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayMessage(op={})", self.op)
        }
    }
}
