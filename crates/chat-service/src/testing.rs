//! In-memory collaborators for tests
//!
//! `InMemoryStore` implements every conversation store trait over one shared
//! state so joins such as "conversations for user" behave like the SQL ones.
//! It enforces the same uniqueness rules as the database indexes, so the
//! duplicate-conversation race surfaces as `DomainError::DuplicateConversation`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chat_common::auth::JwtService;
use chat_core::traits::{
    ConversationFilter, ConversationRepository, EventPublisher, MessageQuery, MessageRepository,
    ParticipantRepository, PostingDirectory, ReactionRepository, ReadReceiptRepository,
    RepoResult,
};
use chat_core::{
    Conversation, ConversationEvent, ConversationId, ConversationKind, DomainError, Message,
    MessageId, Participant, ParticipantKey, Reaction, ReadReceipt, UserId,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::services::{ServiceContext, ServiceContextBuilder};

/// Secret used by [`test_context`] to sign tokens
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-conversations";

#[derive(Default)]
struct State {
    conversations: Vec<Conversation>,
    participants: Vec<Participant>,
    /// Insertion order is the tie-break for equal timestamps
    messages: Vec<Message>,
    reactions: Vec<Reaction>,
    receipts: Vec<ReadReceipt>,
}

impl State {
    fn conversation_mut(&mut self, id: ConversationId) -> RepoResult<&mut Conversation> {
        self.conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(DomainError::ConversationNotFound(id))
    }

    fn participant_mut(
        &mut self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Option<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.conversation_id == conversation_id && p.user_id == user_id)
    }

    fn is_active_member(&self, conversation_id: ConversationId, user_id: UserId) -> bool {
        self.participants
            .iter()
            .any(|p| p.conversation_id == conversation_id && p.user_id == user_id && p.is_active())
    }

    /// Mirrors the partial unique indexes on `conversations`
    fn violates_uniqueness(&self, candidate: &Conversation) -> bool {
        let Some(posting_ref) = candidate.posting_ref.as_deref() else {
            return false;
        };
        self.conversations.iter().any(|c| {
            !c.archived
                && c.kind == candidate.kind
                && c.posting_ref.as_deref() == Some(posting_ref)
                && (candidate.kind == ConversationKind::Group
                    || c.participant_key == candidate.participant_key)
        })
    }
}

/// Shared in-memory conversation store
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations, archived included
    pub fn conversation_count(&self) -> usize {
        self.state.lock().conversations.len()
    }

    /// Number of participant rows for a conversation, active or left
    pub fn participant_rows(&self, conversation_id: ConversationId) -> usize {
        self.state
            .lock()
            .participants
            .iter()
            .filter(|p| p.conversation_id == conversation_id)
            .count()
    }

    /// Insert a conversation bypassing uniqueness checks
    pub fn seed(&self, conversation: Conversation, participants: Vec<Participant>) {
        let mut state = self.state.lock();
        state.conversations.push(conversation);
        state.participants.extend(participants);
    }
}

#[async_trait]
impl ConversationRepository for InMemoryStore {
    async fn find_by_id(&self, id: ConversationId) -> RepoResult<Option<Conversation>> {
        Ok(self
            .state
            .lock()
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn find_active_group(&self, posting_ref: &str) -> RepoResult<Option<Conversation>> {
        Ok(self
            .state
            .lock()
            .conversations
            .iter()
            .find(|c| {
                !c.archived
                    && c.kind == ConversationKind::Group
                    && c.posting_ref.as_deref() == Some(posting_ref)
            })
            .cloned())
    }

    async fn find_active_pairwise(
        &self,
        posting_ref: &str,
        kind: ConversationKind,
        key: &ParticipantKey,
    ) -> RepoResult<Option<Conversation>> {
        Ok(self
            .state
            .lock()
            .conversations
            .iter()
            .find(|c| {
                !c.archived
                    && c.kind == kind
                    && c.posting_ref.as_deref() == Some(posting_ref)
                    && c.participant_key.as_ref() == Some(key)
            })
            .cloned())
    }

    async fn create(
        &self,
        conversation: &Conversation,
        participants: &[Participant],
    ) -> RepoResult<()> {
        let mut state = self.state.lock();
        if state.violates_uniqueness(conversation) {
            return Err(DomainError::DuplicateConversation);
        }
        state.conversations.push(conversation.clone());
        state.participants.extend_from_slice(participants);
        Ok(())
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        filter: &ConversationFilter,
    ) -> RepoResult<Vec<Conversation>> {
        let state = self.state.lock();
        let mut found: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|c| state.is_active_member(c.id, user_id))
            .filter(|c| filter.include_archived || !c.archived)
            .filter(|c| filter.kind.map_or(true, |k| c.kind == k))
            .filter(|c| {
                filter
                    .posting_ref
                    .as_deref()
                    .map_or(true, |p| c.posting_ref.as_deref() == Some(p))
            })
            .cloned()
            .collect();

        found.sort_by(|a, b| {
            b.last_activity_at
                .cmp(&a.last_activity_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        found.truncate(filter.limit.clamp(1, 100) as usize);
        Ok(found)
    }

    async fn touch(&self, id: ConversationId, at: DateTime<Utc>) -> RepoResult<()> {
        self.state.lock().conversation_mut(id)?.touch(at);
        Ok(())
    }

    async fn set_archived(&self, id: ConversationId, archived: bool) -> RepoResult<()> {
        self.state.lock().conversation_mut(id)?.archived = archived;
        Ok(())
    }

    async fn adjust_participant_count(&self, id: ConversationId, delta: i32) -> RepoResult<()> {
        let mut state = self.state.lock();
        let conversation = state.conversation_mut(id)?;
        conversation.participant_count = (conversation.participant_count + delta).max(0);
        Ok(())
    }
}

#[async_trait]
impl ParticipantRepository for InMemoryStore {
    async fn find(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> RepoResult<Option<Participant>> {
        Ok(self
            .state
            .lock()
            .participant_mut(conversation_id, user_id)
            .cloned())
    }

    async fn list_active(&self, conversation_id: ConversationId) -> RepoResult<Vec<Participant>> {
        let mut active: Vec<Participant> = self
            .state
            .lock()
            .participants
            .iter()
            .filter(|p| p.conversation_id == conversation_id && p.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(active)
    }

    async fn insert(&self, participant: &Participant) -> RepoResult<()> {
        let mut state = self.state.lock();
        if state
            .participant_mut(participant.conversation_id, participant.user_id)
            .is_some()
        {
            return Err(DomainError::AlreadyParticipant);
        }
        state.participants.push(participant.clone());
        Ok(())
    }

    async fn reactivate(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let mut state = self.state.lock();
        match state.participant_mut(conversation_id, user_id) {
            Some(p) if !p.is_active() => {
                p.reactivate(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_left(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let mut state = self.state.lock();
        match state.participant_mut(conversation_id, user_id) {
            Some(p) if p.is_active() => {
                p.leave(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_unread(
        &self,
        conversation_id: ConversationId,
        except: UserId,
    ) -> RepoResult<()> {
        for p in self.state.lock().participants.iter_mut().filter(|p| {
            p.conversation_id == conversation_id && p.user_id != except && p.is_active()
        }) {
            p.unread_count += 1;
        }
        Ok(())
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        if let Some(p) = self.state.lock().participant_mut(conversation_id, user_id) {
            p.last_read_at = Some(p.last_read_at.map_or(at, |prev| prev.max(at)));
            p.unread_count = 0;
        }
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Message>> {
        Ok(self
            .state
            .lock()
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>> {
        let state = self.state.lock();
        let mut history: Vec<&Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        history.sort_by_key(|m| m.created_at);

        if let Some(before) = query.before {
            match history.iter().position(|m| m.id == before) {
                Some(idx) => history.truncate(idx),
                None => return Ok(Vec::new()),
            }
        }

        let limit = query.limit.clamp(1, 100) as usize;
        let start = history.len().saturating_sub(limit);
        Ok(history[start..].iter().map(|m| (*m).clone()).collect())
    }

    async fn create(&self, message: &Message) -> RepoResult<DateTime<Utc>> {
        let mut state = self.state.lock();
        let latest = state.messages.iter().map(|m| m.created_at).max();
        let mut stored = message.clone();
        stored.created_at = latest.map_or_else(Utc::now, |at| at.max(Utc::now()));
        let created_at = stored.created_at;
        state.messages.push(stored);
        Ok(created_at)
    }

    async fn update(&self, message: &Message) -> RepoResult<()> {
        let mut state = self.state.lock();
        let stored = state
            .messages
            .iter_mut()
            .find(|m| m.id == message.id && !m.is_deleted())
            .ok_or(DomainError::MessageNotFound(message.id))?;
        stored.content.clone_from(&message.content);
        stored.edited_at = message.edited_at;
        stored.metadata.clone_from(&message.metadata);
        Ok(())
    }

    async fn soft_delete(&self, id: MessageId, at: DateTime<Utc>) -> RepoResult<bool> {
        let mut state = self.state.lock();
        let stored = state
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DomainError::MessageNotFound(id))?;
        Ok(stored.soft_delete(at))
    }

    async fn latest(&self, conversation_id: ConversationId) -> RepoResult<Option<Message>> {
        let state = self.state.lock();
        // max_by_key returns the last maximum, i.e. the latest inserted on ties
        Ok(state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn count(&self, conversation_id: ConversationId) -> RepoResult<i64> {
        Ok(self
            .state
            .lock()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .count() as i64)
    }
}

#[async_trait]
impl ReactionRepository for InMemoryStore {
    async fn create(&self, reaction: &Reaction) -> RepoResult<()> {
        let mut state = self.state.lock();
        if state.reactions.iter().any(|r| r.key() == reaction.key()) {
            return Err(DomainError::ReactionAlreadyExists);
        }
        state.reactions.push(reaction.clone());
        Ok(())
    }

    async fn find_by_message(&self, message_id: MessageId) -> RepoResult<Vec<Reaction>> {
        Ok(self
            .state
            .lock()
            .reactions
            .iter()
            .filter(|r| r.message_id == message_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReadReceiptRepository for InMemoryStore {
    async fn record(&self, receipt: &ReadReceipt) -> RepoResult<bool> {
        let mut state = self.state.lock();
        if state
            .receipts
            .iter()
            .any(|r| r.message_id == receipt.message_id && r.user_id == receipt.user_id)
        {
            return Ok(false);
        }
        state.receipts.push(receipt.clone());
        Ok(true)
    }

    async fn find_by_message(&self, message_id: MessageId) -> RepoResult<Vec<ReadReceipt>> {
        Ok(self
            .state
            .lock()
            .receipts
            .iter()
            .filter(|r| r.message_id == message_id)
            .cloned()
            .collect())
    }
}

/// Posting directory backed by a map
#[derive(Clone, Default)]
pub struct StaticPostingDirectory {
    titles: Arc<Mutex<HashMap<String, String>>>,
}

impl StaticPostingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posting(self, posting_ref: impl Into<String>, title: impl Into<String>) -> Self {
        self.titles.lock().insert(posting_ref.into(), title.into());
        self
    }
}

#[async_trait]
impl PostingDirectory for StaticPostingDirectory {
    async fn posting_title(&self, posting_ref: &str) -> RepoResult<Option<String>> {
        Ok(self.titles.lock().get(posting_ref).cloned())
    }
}

/// Publisher that keeps every event it sees
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<ConversationEvent>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ConversationEvent> {
        self.events.lock().clone()
    }

    /// Event names in publish order
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(ConversationEvent::name).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &ConversationEvent) -> RepoResult<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Everything a test needs to drive the services
pub struct TestHarness {
    pub ctx: ServiceContext,
    pub store: InMemoryStore,
    pub postings: StaticPostingDirectory,
    pub events: RecordingPublisher,
}

/// Context over a fresh in-memory store with a recording publisher
pub fn test_context() -> TestHarness {
    let events = RecordingPublisher::new();
    let mut harness = test_context_with_publisher(Arc::new(events.clone()));
    harness.events = events;
    harness
}

/// Context over a fresh in-memory store that publishes to `publisher`
pub fn test_context_with_publisher(publisher: Arc<dyn EventPublisher>) -> TestHarness {
    let store = InMemoryStore::new();
    let postings = StaticPostingDirectory::new();
    let ctx = in_memory_builder(&store, &postings)
        .publisher(publisher)
        .build()
        .expect("in-memory context is complete");

    TestHarness {
        ctx,
        store,
        postings,
        events: RecordingPublisher::new(),
    }
}

/// Builder pre-populated with in-memory repositories and a test JWT service
pub fn in_memory_builder(
    store: &InMemoryStore,
    postings: &StaticPostingDirectory,
) -> ServiceContextBuilder {
    let store = Arc::new(store.clone());
    ServiceContextBuilder::new()
        .conversation_repo(store.clone())
        .participant_repo(store.clone())
        .message_repo(store.clone())
        .reaction_repo(store.clone())
        .receipt_repo(store)
        .postings(Arc::new(postings.clone()))
        .jwt_service(Arc::new(JwtService::new(TEST_JWT_SECRET, 3600)))
}
