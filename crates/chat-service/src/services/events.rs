//! Event fan-out
//!
//! A gateway instance publishes each event twice: straight into its own
//! rooms, and onto Redis for every other instance.

use std::sync::Arc;

use async_trait::async_trait;
use chat_core::traits::{EventPublisher, RepoResult};
use chat_core::ConversationEvent;
use tracing::warn;

/// Publishes to every sink in order; one failing sink does not stop the rest
#[derive(Clone, Default)]
pub struct FanoutPublisher {
    sinks: Vec<Arc<dyn EventPublisher>>,
}

impl FanoutPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventPublisher>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventPublisher for FanoutPublisher {
    async fn publish(&self, event: &ConversationEvent) -> RepoResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.publish(event).await {
                warn!(error = %e, event = event.name(), "Event sink failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

#[async_trait]
impl EventPublisher for NoopPublisher {
    async fn publish(&self, _event: &ConversationEvent) -> RepoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingPublisher;
    use chat_core::events::ParticipantLeftEvent;
    use chat_core::{ConversationId, DomainError, UserId};
    use chrono::Utc;

    struct Failing;

    #[async_trait]
    impl EventPublisher for Failing {
        async fn publish(&self, _event: &ConversationEvent) -> RepoResult<()> {
            Err(DomainError::CacheError("redis down".to_string()))
        }
    }

    fn left() -> ConversationEvent {
        ConversationEvent::ParticipantLeft(ParticipantLeftEvent {
            conversation_id: ConversationId::new(),
            user_id: UserId::new(),
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_others() {
        let recorder = RecordingPublisher::new();
        let fanout = FanoutPublisher::new()
            .with(Arc::new(Failing))
            .with(Arc::new(recorder.clone()));

        let result = fanout.publish(&left()).await;

        assert!(matches!(result, Err(DomainError::CacheError(_))));
        assert_eq!(recorder.names(), vec!["participant:left"]);
        assert_eq!(fanout.len(), 2);
    }

    #[tokio::test]
    async fn test_noop_publisher_accepts_everything() {
        assert!(NoopPublisher.publish(&left()).await.is_ok());
        assert!(FanoutPublisher::new().is_empty());
    }
}
