//! Participant entity - a user's membership in a conversation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ConversationId, UserId};

/// Participant role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantRole {
    Admin,
    #[default]
    Member,
}

impl ParticipantRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ADMIN" => Some(Self::Admin),
            "MEMBER" => Some(Self::Member),
            _ => None,
        }
    }
}

/// Participant entity
///
/// Leaving stamps `left_at`; the row is never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub last_read_at: Option<DateTime<Utc>>,
    pub muted: bool,
    pub unread_count: i32,
}

impl Participant {
    pub fn new(conversation_id: ConversationId, user_id: UserId, role: ParticipantRole) -> Self {
        Self {
            conversation_id,
            user_id,
            role,
            joined_at: Utc::now(),
            left_at: None,
            last_read_at: None,
            muted: false,
            unread_count: 0,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == ParticipantRole::Admin
    }

    /// Rejoin after leaving
    pub fn reactivate(&mut self, at: DateTime<Utc>) {
        self.left_at = None;
        self.joined_at = at;
        self.unread_count = 0;
    }

    pub fn leave(&mut self, at: DateTime<Utc>) {
        if self.left_at.is_none() {
            self.left_at = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_participant_is_active() {
        let p = Participant::new(ConversationId::new(), UserId::new(), ParticipantRole::Member);
        assert!(p.is_active());
        assert!(!p.is_admin());
    }

    #[test]
    fn test_leave_then_reactivate() {
        let mut p = Participant::new(ConversationId::new(), UserId::new(), ParticipantRole::Admin);
        let left = Utc::now();
        p.leave(left);
        assert!(!p.is_active());

        // second leave keeps the original timestamp
        p.leave(left + chrono::Duration::seconds(5));
        assert_eq!(p.left_at, Some(left));

        p.reactivate(Utc::now());
        assert!(p.is_active());
        assert!(p.is_admin());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(ParticipantRole::parse("ADMIN"), Some(ParticipantRole::Admin));
        assert_eq!(ParticipantRole::parse("OWNER"), None);
    }
}
