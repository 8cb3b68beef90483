//! Room channel naming.
//!
//! Every conversation room maps to one Redis channel. The room key is
//! carried verbatim; it is never parsed or normalized.

use chat_core::ConversationId;

pub const CONVERSATION_CHANNEL_PREFIX: &str = "conversation:";

/// The Redis channel of one conversation room
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PubSubChannel {
    room: String,
}

impl PubSubChannel {
    #[must_use]
    pub fn conversation(conversation_id: ConversationId) -> Self {
        Self::room(conversation_id.to_string())
    }

    /// Channel for a room key as the gateway sees it
    #[must_use]
    pub fn room(room: impl Into<String>) -> Self {
        Self { room: room.into() }
    }

    #[must_use]
    pub fn name(&self) -> String {
        format!("{CONVERSATION_CHANNEL_PREFIX}{}", self.room)
    }

    #[must_use]
    pub fn room_key(&self) -> &str {
        &self.room
    }

    /// `None` for channels outside the conversation namespace
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        name.strip_prefix(CONVERSATION_CHANNEL_PREFIX)
            .filter(|room| !room.is_empty())
            .map(Self::room)
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(CONVERSATION_CHANNEL_PREFIX)?;
        f.write_str(&self.room)
    }
}
