//! Emoji reaction on a message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{MessageId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
}

impl Reaction {
    pub fn new(message_id: MessageId, user_id: UserId, emoji: impl Into<String>) -> Self {
        Self {
            message_id,
            user_id,
            emoji: emoji.into(),
            created_at: Utc::now(),
        }
    }

    /// Identity of a reaction; a second reaction with the same key is a duplicate
    #[must_use]
    pub fn key(&self) -> (MessageId, UserId, &str) {
        (self.message_id, self.user_id, &self.emoji)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_timestamp() {
        let (message, user) = (MessageId::new(), UserId::new());
        let first = Reaction::new(message, user, "👍");
        let mut again = Reaction::new(message, user, "👍");
        again.created_at = first.created_at - chrono::Duration::minutes(5);

        assert_eq!(first.key(), again.key());
        assert_ne!(first.key(), Reaction::new(message, user, "🎉").key());
        assert_ne!(first.key(), Reaction::new(message, UserId::new(), "👍").key());
    }
}
