//! Redis Pub/Sub publisher.
//!
//! Relays persisted conversation events to every gateway instance.

use async_trait::async_trait;
use chat_core::{ConversationEvent, DomainError, EventPublisher, RepoResult};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;

/// Envelope for events crossing instance boundaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubEvent {
    /// Instance that published the event; it already delivered locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub event: ConversationEvent,
}

impl PubSubEvent {
    #[must_use]
    pub fn new(event: ConversationEvent) -> Self {
        Self {
            origin: None,
            event,
        }
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// True if the event was published by `instance`
    #[must_use]
    pub fn is_from(&self, instance: &str) -> bool {
        self.origin.as_deref() == Some(instance)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
    origin: Option<String>,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool, origin: None }
    }

    /// Tag every published envelope with this instance id
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Publish an envelope to a channel
    pub async fn publish_to(&self, channel: &PubSubChannel, event: &PubSubEvent) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();
        let payload = event.to_json()?;

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event_type = %event.event.name(),
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }

    /// Publish a conversation event to its room channel
    pub async fn publish_event(&self, event: &ConversationEvent) -> RedisResult<u32> {
        let mut envelope = PubSubEvent::new(event.clone());
        envelope.origin.clone_from(&self.origin);

        let channel = PubSubChannel::conversation(event.conversation_id());
        self.publish_to(&channel, &envelope).await
    }
}

#[async_trait]
impl EventPublisher for Publisher {
    async fn publish(&self, event: &ConversationEvent) -> RepoResult<()> {
        self.publish_event(event)
            .await
            .map(|_| ())
            .map_err(|e| DomainError::CacheError(e.to_string()))
    }
}
