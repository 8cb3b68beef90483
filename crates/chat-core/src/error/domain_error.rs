//! Errors raised by conversation and message rules

use thiserror::Error;

use crate::value_objects::{ConversationId, MessageId};

#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Also returned when the requester is not a participant, so existence never leaks
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("Participant not found")]
    ParticipantNotFound,

    #[error("Posting not found: {0}")]
    PostingNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid participants: {0}")]
    InvalidParticipants(String),

    #[error("Group conversations require a name")]
    MissingGroupName,

    #[error("Post-linked conversations require a posting reference")]
    MissingPostingRef,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Cannot join this conversation without an invitation")]
    SelfJoinNotAllowed,

    #[error("Not message sender")]
    NotMessageSender,

    #[error("Reaction already exists")]
    ReactionAlreadyExists,

    /// Store-level uniqueness race; resolved by the policy layer
    #[error("Conversation already exists")]
    DuplicateConversation,

    /// Store-level uniqueness race on participant insert
    #[error("Already a participant")]
    AlreadyParticipant,

    #[error("Conversation is archived")]
    ConversationArchived,

    #[error("Message has been deleted")]
    MessageDeleted,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Which family a [`DomainError`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainErrorKind {
    NotFound,
    Validation,
    Authorization,
    Conflict,
    Infrastructure,
}

impl DomainError {
    #[must_use]
    pub fn kind(&self) -> DomainErrorKind {
        match self {
            Self::ConversationNotFound(_)
            | Self::MessageNotFound(_)
            | Self::ParticipantNotFound
            | Self::PostingNotFound(_) => DomainErrorKind::NotFound,
            Self::ValidationError(_)
            | Self::InvalidParticipants(_)
            | Self::MissingGroupName
            | Self::MissingPostingRef
            | Self::ContentTooLong { .. } => DomainErrorKind::Validation,
            Self::NotAuthorized(_) | Self::SelfJoinNotAllowed | Self::NotMessageSender => {
                DomainErrorKind::Authorization
            }
            Self::ReactionAlreadyExists
            | Self::DuplicateConversation
            | Self::AlreadyParticipant
            | Self::ConversationArchived
            | Self::MessageDeleted => DomainErrorKind::Conflict,
            Self::DatabaseError(_) | Self::CacheError(_) | Self::InternalError(_) => {
                DomainErrorKind::Infrastructure
            }
        }
    }

    /// Reason code sent to clients; storage failures collapse to `INTERNAL_ERROR`
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConversationNotFound(_)
            | Self::MessageNotFound(_)
            | Self::ParticipantNotFound
            | Self::PostingNotFound(_) => "NOT_FOUND",
            Self::ValidationError(_) | Self::MissingPostingRef => "VALIDATION_ERROR",
            Self::InvalidParticipants(_) => "INVALID_PARTICIPANTS",
            Self::MissingGroupName => "MISSING_GROUP_NAME",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::NotAuthorized(_) => "NOT_AUTHORIZED",
            Self::SelfJoinNotAllowed => "SELF_JOIN_NOT_ALLOWED",
            Self::NotMessageSender => "NOT_MESSAGE_SENDER",
            Self::ReactionAlreadyExists => "REACTION_ALREADY_EXISTS",
            Self::DuplicateConversation => "DUPLICATE_CONVERSATION",
            Self::AlreadyParticipant => "ALREADY_PARTICIPANT",
            Self::ConversationArchived => "CONVERSATION_ARCHIVED",
            Self::MessageDeleted => "MESSAGE_DELETED",
            Self::DatabaseError(_) | Self::CacheError(_) | Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == DomainErrorKind::NotFound
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == DomainErrorKind::Validation
    }

    pub fn is_authorization(&self) -> bool {
        self.kind() == DomainErrorKind::Authorization
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == DomainErrorKind::Conflict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DomainError::ConversationNotFound(ConversationId::new()).code(), "NOT_FOUND");
        assert_eq!(DomainError::NotAuthorized("admin role required".into()).code(), "NOT_AUTHORIZED");
        assert_eq!(DomainError::SelfJoinNotAllowed.code(), "SELF_JOIN_NOT_ALLOWED");
    }

    #[test]
    fn test_storage_failures_do_not_leak() {
        for err in [
            DomainError::DatabaseError("connection refused".into()),
            DomainError::CacheError("timeout".into()),
            DomainError::InternalError("boom".into()),
        ] {
            assert_eq!(err.kind(), DomainErrorKind::Infrastructure);
            assert_eq!(err.code(), "INTERNAL_ERROR");
        }
    }

    #[test]
    fn test_kinds() {
        assert!(DomainError::ParticipantNotFound.is_not_found());
        assert!(DomainError::NotMessageSender.is_authorization());
        assert!(DomainError::MissingGroupName.is_validation());
        assert!(DomainError::ConversationArchived.is_conflict());
        assert!(!DomainError::ParticipantNotFound.is_authorization());
    }

    #[test]
    fn test_display() {
        let err = DomainError::ContentTooLong { max: 4000 };
        assert_eq!(err.to_string(), "Content too long: max 4000 characters");
    }
}
