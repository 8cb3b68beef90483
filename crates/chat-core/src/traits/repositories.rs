//! Repository traits (ports) - define the interface for data access
//!
//! These traits follow the Repository pattern from Domain-Driven Design.
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Conversation, ConversationKind, Message, Participant, Reaction, ReadReceipt};
use crate::error::DomainError;
use crate::value_objects::{ConversationId, MessageId, ParticipantKey, UserId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Conversation Repository
// ============================================================================

/// Filters for listing a user's conversations
#[derive(Debug, Clone)]
pub struct ConversationFilter {
    pub include_archived: bool,
    pub kind: Option<ConversationKind>,
    pub posting_ref: Option<String>,
    pub limit: i64,
}

impl Default for ConversationFilter {
    fn default() -> Self {
        Self {
            include_archived: false,
            kind: None,
            posting_ref: None,
            limit: 50,
        }
    }
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Find conversation by ID, archived or not
    async fn find_by_id(&self, id: ConversationId) -> RepoResult<Option<Conversation>>;

    /// Find the non-archived GROUP conversation for a posting
    async fn find_active_group(&self, posting_ref: &str) -> RepoResult<Option<Conversation>>;

    /// Find the non-archived pairwise conversation for a posting and participant set
    async fn find_active_pairwise(
        &self,
        posting_ref: &str,
        kind: ConversationKind,
        key: &ParticipantKey,
    ) -> RepoResult<Option<Conversation>>;

    /// Insert the conversation and its initial participants atomically.
    ///
    /// Fails with [`DomainError::DuplicateConversation`] when a uniqueness
    /// constraint rejects the conversation row.
    async fn create(&self, conversation: &Conversation, participants: &[Participant])
        -> RepoResult<()>;

    /// Conversations where the user holds an active participant record,
    /// most recently active first
    async fn find_by_user(
        &self,
        user_id: UserId,
        filter: &ConversationFilter,
    ) -> RepoResult<Vec<Conversation>>;

    /// Bump `last_activity_at`
    async fn touch(&self, id: ConversationId, at: DateTime<Utc>) -> RepoResult<()>;

    async fn set_archived(&self, id: ConversationId, archived: bool) -> RepoResult<()>;

    /// Adjust the cached participant count by `delta`
    async fn adjust_participant_count(&self, id: ConversationId, delta: i32) -> RepoResult<()>;
}

// ============================================================================
// Participant Repository
// ============================================================================

#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// Find the participant record, active or left
    async fn find(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> RepoResult<Option<Participant>>;

    /// Find the participant record only if it is active
    async fn find_active(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> RepoResult<Option<Participant>> {
        Ok(self
            .find(conversation_id, user_id)
            .await?
            .filter(Participant::is_active))
    }

    /// All active participants, earliest joined first
    async fn list_active(&self, conversation_id: ConversationId) -> RepoResult<Vec<Participant>>;

    /// Insert a new record; [`DomainError::AlreadyParticipant`] if one exists
    async fn insert(&self, participant: &Participant) -> RepoResult<()>;

    /// Clear `left_at`; returns false if the record was already active
    async fn reactivate(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<bool>;

    /// Stamp `left_at`; returns false if the record was not active
    async fn mark_left(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<bool>;

    /// Increment the cached unread count of every active participant but one
    async fn increment_unread(
        &self,
        conversation_id: ConversationId,
        except: UserId,
    ) -> RepoResult<()>;

    /// Set `last_read_at` and zero the unread count
    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<()>;
}

// ============================================================================
// Message Repository
// ============================================================================

/// Pagination options for message queries
#[derive(Debug, Clone)]
pub struct MessageQuery {
    /// Only messages ordered before this one
    pub before: Option<MessageId>,
    pub limit: i64,
}

impl Default for MessageQuery {
    fn default() -> Self {
        Self {
            before: None,
            limit: 50,
        }
    }
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find message by ID, including soft-deleted ones
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Message>>;

    /// Messages in conversation order (created_at, then insertion), oldest first.
    ///
    /// With a `before` cursor the page ends just before that message; without
    /// one it is the latest page. Soft-deleted messages are included.
    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>>;

    /// Store a new message; returns the store-assigned `created_at`.
    ///
    /// Stamps never go backwards in arrival order within a conversation.
    async fn create(&self, message: &Message) -> RepoResult<DateTime<Utc>>;

    /// Update message content (edit)
    async fn update(&self, message: &Message) -> RepoResult<()>;

    /// Stamp `deleted_at`; returns false if already deleted
    async fn soft_delete(&self, id: MessageId, at: DateTime<Utc>) -> RepoResult<bool>;

    /// Most recent message, deleted or not
    async fn latest(&self, conversation_id: ConversationId) -> RepoResult<Option<Message>>;

    /// Number of messages, soft-deleted included
    async fn count(&self, conversation_id: ConversationId) -> RepoResult<i64>;
}

// ============================================================================
// Reaction Repository
// ============================================================================

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Add a reaction; [`DomainError::ReactionAlreadyExists`] on a duplicate
    async fn create(&self, reaction: &Reaction) -> RepoResult<()>;

    async fn find_by_message(&self, message_id: MessageId) -> RepoResult<Vec<Reaction>>;
}

// ============================================================================
// Read Receipt Repository
// ============================================================================

#[async_trait]
pub trait ReadReceiptRepository: Send + Sync {
    /// Record a receipt; returns false when one already existed
    async fn record(&self, receipt: &ReadReceipt) -> RepoResult<bool>;

    async fn find_by_message(&self, message_id: MessageId) -> RepoResult<Vec<ReadReceipt>>;
}
