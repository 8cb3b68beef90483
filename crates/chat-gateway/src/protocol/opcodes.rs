//! Frame operation codes

use serde::{Deserialize, Serialize};

/// The `op` field of a frame
///
/// 5, 8 and 9 are unassigned; a frame carrying them does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum OpCode {
    /// Named event from the server, sequenced per connection
    Dispatch = 0,
    /// Sent by the client; the server answers with `HeartbeatAck`
    Heartbeat = 1,
    Identify = 2,
    JoinRoom = 3,
    LeaveRoom = 4,
    SendMessage = 6,
    /// Server is going away; the client should reconnect
    Reconnect = 7,
    /// First frame on every connection, carries the heartbeat interval
    Hello = 10,
    HeartbeatAck = 11,
}

impl OpCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "DISPATCH",
            Self::Heartbeat => "HEARTBEAT",
            Self::Identify => "IDENTIFY",
            Self::JoinRoom => "JOIN_ROOM",
            Self::LeaveRoom => "LEAVE_ROOM",
            Self::SendMessage => "SEND_MESSAGE",
            Self::Reconnect => "RECONNECT",
            Self::Hello => "HELLO",
            Self::HeartbeatAck => "HEARTBEAT_ACK",
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            3 => Self::JoinRoom,
            4 => Self::LeaveRoom,
            6 => Self::SendMessage,
            7 => Self::Reconnect,
            10 => Self::Hello,
            11 => Self::HeartbeatAck,
            other => return Err(format!("unknown op code {other}")),
        })
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op.as_u8()
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.as_u8())
    }
}
