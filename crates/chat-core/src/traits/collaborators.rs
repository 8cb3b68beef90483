//! Ports to collaborators outside the conversation store

use async_trait::async_trait;

use crate::events::ConversationEvent;
use crate::traits::RepoResult;

/// Read-only lookup of external posting entities
#[async_trait]
pub trait PostingDirectory: Send + Sync {
    /// Title of the posting, or `None` if the reference does not resolve
    async fn posting_title(&self, posting_ref: &str) -> RepoResult<Option<String>>;
}

/// Sink for persisted conversation events
///
/// Implementations deliver best-effort; a failed publish never rolls back the
/// change that produced the event.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &ConversationEvent) -> RepoResult<()>;
}
