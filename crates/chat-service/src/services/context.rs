//! Service context - dependency container for services
//!
//! Holds the conversation store, collaborator ports, and the event sink
//! every service publishes to.

use std::sync::Arc;

use chat_cache::RedisPool;
use chat_common::auth::JwtService;
use chat_core::traits::{
    ConversationRepository, EventPublisher, MessageRepository, ParticipantRepository,
    PostingDirectory, ReactionRepository, ReadReceiptRepository,
};
use chat_core::ConversationEvent;
use chat_db::{
    PgConversationRepository, PgMessageRepository, PgParticipantRepository, PgPool,
    PgPostingDirectory, PgReactionRepository, PgReadReceiptRepository,
};
use tracing::warn;

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// Passed explicitly to every service and to the gateway; nothing here is a
/// process-wide singleton, so several contexts can coexist in one test.
#[derive(Clone)]
pub struct ServiceContext {
    // Pools, present only when backed by real infrastructure
    pool: Option<PgPool>,
    redis_pool: Option<RedisPool>,

    // Conversation store
    conversation_repo: Arc<dyn ConversationRepository>,
    participant_repo: Arc<dyn ParticipantRepository>,
    message_repo: Arc<dyn MessageRepository>,
    reaction_repo: Arc<dyn ReactionRepository>,
    receipt_repo: Arc<dyn ReadReceiptRepository>,

    // Collaborators
    postings: Arc<dyn PostingDirectory>,
    publisher: Arc<dyn EventPublisher>,
    jwt_service: Arc<JwtService>,
}

impl ServiceContext {
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Pools ===

    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    pub fn redis_pool(&self) -> Option<&RedisPool> {
        self.redis_pool.as_ref()
    }

    // === Repositories ===

    pub fn conversation_repo(&self) -> &dyn ConversationRepository {
        self.conversation_repo.as_ref()
    }

    pub fn participant_repo(&self) -> &dyn ParticipantRepository {
        self.participant_repo.as_ref()
    }

    pub fn message_repo(&self) -> &dyn MessageRepository {
        self.message_repo.as_ref()
    }

    pub fn reaction_repo(&self) -> &dyn ReactionRepository {
        self.reaction_repo.as_ref()
    }

    pub fn receipt_repo(&self) -> &dyn ReadReceiptRepository {
        self.receipt_repo.as_ref()
    }

    // === Collaborators ===

    pub fn postings(&self) -> &dyn PostingDirectory {
        self.postings.as_ref()
    }

    pub fn jwt_service(&self) -> &JwtService {
        self.jwt_service.as_ref()
    }

    /// Publish a persisted change; failures are logged, never returned
    pub async fn publish(&self, event: ConversationEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                error = %e,
                event = event.name(),
                conversation_id = %event.conversation_id(),
                "Failed to publish conversation event"
            );
        }
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("pool", &self.pool.is_some())
            .field("redis_pool", &self.redis_pool.is_some())
            .field("repositories", &"...")
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    pool: Option<PgPool>,
    redis_pool: Option<RedisPool>,
    conversation_repo: Option<Arc<dyn ConversationRepository>>,
    participant_repo: Option<Arc<dyn ParticipantRepository>>,
    message_repo: Option<Arc<dyn MessageRepository>>,
    reaction_repo: Option<Arc<dyn ReactionRepository>>,
    receipt_repo: Option<Arc<dyn ReadReceiptRepository>>,
    postings: Option<Arc<dyn PostingDirectory>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    jwt_service: Option<Arc<JwtService>>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use PostgreSQL for the whole conversation store and posting lookups
    pub fn postgres(mut self, pool: PgPool) -> Self {
        self.conversation_repo = Some(Arc::new(PgConversationRepository::new(pool.clone())));
        self.participant_repo = Some(Arc::new(PgParticipantRepository::new(pool.clone())));
        self.message_repo = Some(Arc::new(PgMessageRepository::new(pool.clone())));
        self.reaction_repo = Some(Arc::new(PgReactionRepository::new(pool.clone())));
        self.receipt_repo = Some(Arc::new(PgReadReceiptRepository::new(pool.clone())));
        self.postings = Some(Arc::new(PgPostingDirectory::new(pool.clone())));
        self.pool = Some(pool);
        self
    }

    pub fn redis_pool(mut self, redis_pool: RedisPool) -> Self {
        self.redis_pool = Some(redis_pool);
        self
    }

    pub fn conversation_repo(mut self, repo: Arc<dyn ConversationRepository>) -> Self {
        self.conversation_repo = Some(repo);
        self
    }

    pub fn participant_repo(mut self, repo: Arc<dyn ParticipantRepository>) -> Self {
        self.participant_repo = Some(repo);
        self
    }

    pub fn message_repo(mut self, repo: Arc<dyn MessageRepository>) -> Self {
        self.message_repo = Some(repo);
        self
    }

    pub fn reaction_repo(mut self, repo: Arc<dyn ReactionRepository>) -> Self {
        self.reaction_repo = Some(repo);
        self
    }

    pub fn receipt_repo(mut self, repo: Arc<dyn ReadReceiptRepository>) -> Self {
        self.receipt_repo = Some(repo);
        self
    }

    pub fn postings(mut self, postings: Arc<dyn PostingDirectory>) -> Self {
        self.postings = Some(postings);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn jwt_service(mut self, service: Arc<JwtService>) -> Self {
        self.jwt_service = Some(service);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        fn required<T>(value: Option<T>, name: &str) -> ServiceResult<T> {
            value.ok_or_else(|| ServiceError::validation(format!("{name} is required")))
        }

        Ok(ServiceContext {
            pool: self.pool,
            redis_pool: self.redis_pool,
            conversation_repo: required(self.conversation_repo, "conversation_repo")?,
            participant_repo: required(self.participant_repo, "participant_repo")?,
            message_repo: required(self.message_repo, "message_repo")?,
            reaction_repo: required(self.reaction_repo, "reaction_repo")?,
            receipt_repo: required(self.receipt_repo, "receipt_repo")?,
            postings: required(self.postings, "postings")?,
            publisher: required(self.publisher, "publisher")?,
            jwt_service: required(self.jwt_service, "jwt_service")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_reports_missing_dependency() {
        let err = ServiceContextBuilder::new()
            .jwt_service(Arc::new(JwtService::new("secret", 60)))
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("conversation_repo is required"));
    }
}
