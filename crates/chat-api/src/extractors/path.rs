//! Path parameter extractors
//!
//! Conversation and message ids arrive as UUID strings; parsing happens in
//! the accessors so a bad id becomes a 400 with a named parameter.

use chat_core::{ConversationId, MessageId};
use serde::Deserialize;

use crate::response::ApiError;

fn parse_id<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::invalid_path(format!("Invalid {name} format")))
}

/// `/conversations/:conversation_id`
#[derive(Debug, Deserialize)]
pub struct ConversationPath {
    pub conversation_id: String,
}

impl ConversationPath {
    pub fn conversation_id(&self) -> Result<ConversationId, ApiError> {
        parse_id(&self.conversation_id, "conversation_id")
    }
}

/// `/conversations/:conversation_id/messages/:message_id`
#[derive(Debug, Deserialize)]
pub struct MessagePath {
    pub conversation_id: String,
    pub message_id: String,
}

impl MessagePath {
    pub fn conversation_id(&self) -> Result<ConversationId, ApiError> {
        parse_id(&self.conversation_id, "conversation_id")
    }

    pub fn message_id(&self) -> Result<MessageId, ApiError> {
        parse_id(&self.message_id, "message_id")
    }

    pub fn ids(&self) -> Result<(ConversationId, MessageId), ApiError> {
        Ok((self.conversation_id()?, self.message_id()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_path_parses_both_ids() {
        let conversation_id = ConversationId::new();
        let message_id = MessageId::new();
        let path = MessagePath {
            conversation_id: conversation_id.to_string(),
            message_id: message_id.to_string(),
        };

        assert_eq!(path.ids().unwrap(), (conversation_id, message_id));
    }

    #[test]
    fn test_bad_id_names_the_parameter() {
        let path = ConversationPath {
            conversation_id: "42".to_string(),
        };

        let err = path.conversation_id().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PATH_PARAMETER");
        assert!(err.to_string().contains("conversation_id"));
    }
}
