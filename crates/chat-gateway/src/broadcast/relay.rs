//! Cross-instance relay
//!
//! Conversation events persisted through another process reach this
//! gateway on the room's Redis channel and are handed to the local
//! broadcaster. Envelopes this instance published are skipped; they were
//! delivered locally before being relayed.

use super::RoomBroadcaster;
use chat_cache::{RelayedEvent, RoomSubscriber, SubscriberConfig, SubscriberResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct RoomRelay {
    instance_id: String,
    broadcaster: RoomBroadcaster,
    subscriber: RoomSubscriber,
    started: AtomicBool,
}

impl RoomRelay {
    /// Must be called inside a Tokio runtime
    pub fn new(config: SubscriberConfig, instance_id: impl Into<String>, broadcaster: RoomBroadcaster) -> Self {
        Self {
            instance_id: instance_id.into(),
            broadcaster,
            subscriber: RoomSubscriber::spawn(config),
            started: AtomicBool::new(false),
        }
    }

    /// Called when the first local member joins `room`
    pub async fn follow_room(&self, room: &str) -> SubscriberResult<()> {
        self.subscriber.follow(room).await
    }

    /// Called when the last local member leaves `room`
    pub async fn unfollow_room(&self, room: &str) -> SubscriberResult<()> {
        self.subscriber.unfollow(room).await
    }

    /// Unfollow a room whose last local member was evicted
    pub async fn release_room(&self, room: &str) {
        if let Err(e) = self.unfollow_room(room).await {
            tracing::warn!(room = %room, error = %e, "Failed to unfollow room relay channel");
        }
    }

    /// Drop the Redis subscription; local delivery keeps working
    pub async fn stop(&self) {
        if let Err(e) = self.subscriber.shutdown().await {
            tracing::debug!(error = %e, "Relay subscriber already stopped");
        }
    }

    /// Spawn the delivery loop once
    pub fn start(self: Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut events = self.subscriber.events();
        tracing::info!(instance_id = %self.instance_id, "Room relay started");

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(relayed) => {
                        self.deliver(&relayed).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Room relay fell behind; relayed events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            tracing::info!("Room relay stopped");
        });
    }

    /// Returns the number of local deliveries
    async fn deliver(&self, relayed: &RelayedEvent) -> usize {
        if relayed.envelope.is_from(&self.instance_id) {
            return 0;
        }
        if !relayed.is_consistent() {
            tracing::warn!(
                room = %relayed.room,
                event_type = relayed.envelope.event.name(),
                "Event relayed on another room's channel, ignoring"
            );
            return 0;
        }
        let event = &relayed.envelope.event;
        let sent = self.broadcaster.dispatch(event);
        if self.broadcaster.release_departed(event) {
            self.release_room(&relayed.room).await;
        }
        sent
    }
}
