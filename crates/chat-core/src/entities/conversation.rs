//! Conversation entity - a durable thread of messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{ConversationId, ParticipantKey, UserId};

/// Maximum length of a conversation display name
pub const MAX_CONVERSATION_NAME_LENGTH: usize = 100;

/// Conversation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationKind {
    /// Fixed two-party conversation
    Direct,
    /// Named multi-party conversation
    Group,
    /// Conversation tied to an external posting; 1:1 or group depending on live membership
    PostLinked,
}

impl ConversationKind {
    /// Stored and wire representation
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "DIRECT",
            Self::Group => "GROUP",
            Self::PostLinked => "POST_LINKED",
        }
    }

    /// Parse the stored representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DIRECT" => Some(Self::Direct),
            "GROUP" => Some(Self::Group),
            "POST_LINKED" => Some(Self::PostLinked),
            _ => None,
        }
    }

    /// Kinds whose duplicates are keyed by participant set
    #[inline]
    pub fn is_pairwise(self) -> bool {
        !matches!(self, Self::Group)
    }
}

impl std::fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub kind: ConversationKind,
    pub name: Option<String>,
    pub posting_ref: Option<String>,
    pub created_by: UserId,
    pub archived: bool,
    /// Creation-time participant set; only set for pairwise kinds
    pub participant_key: Option<ParticipantKey>,
    pub participant_count: i32,
    pub last_activity_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation owned by `created_by`
    pub fn new(
        kind: ConversationKind,
        created_by: UserId,
        name: Option<String>,
        posting_ref: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            kind,
            name,
            posting_ref,
            created_by,
            archived: false,
            participant_key: None,
            participant_count: 0,
            last_activity_at: now,
            created_at: now,
        }
    }

    /// Attach the participant-set key used for 1:1 deduplication
    pub fn with_participant_key(mut self, key: ParticipantKey) -> Self {
        self.participant_key = Some(key);
        self
    }

    /// Whether the conversation behaves as a group given its live membership.
    ///
    /// GROUP is always group-like; POST_LINKED becomes group-like at three or
    /// more active participants; DIRECT never is.
    pub fn is_group_like(&self, active_participants: usize) -> bool {
        match self.kind {
            ConversationKind::Group => true,
            ConversationKind::PostLinked => active_participants >= 3,
            ConversationKind::Direct => false,
        }
    }

    #[inline]
    pub fn is_one_to_one(&self, active_participants: usize) -> bool {
        !self.is_group_like(active_participants)
    }

    /// Name to show in listings, falling back to the posting title
    pub fn display_name<'a>(&'a self, posting_title: Option<&'a str>) -> Option<&'a str> {
        self.name.as_deref().or(posting_title)
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_activity_at {
            self.last_activity_at = at;
        }
    }
}
