//! Local room fan-out
//!
//! Turns a conversation event into one dispatch and delivers it to every
//! connection in the room on this instance, except the actor's own
//! connections.

use super::RoomRelay;
use crate::connection::ConnectionManager;
use crate::events::room_event_payload;
use crate::protocol::GatewayMessage;
use async_trait::async_trait;
use chat_core::{ConversationEvent, EventPublisher, RepoResult};
use std::sync::{Arc, OnceLock, Weak};

/// Delivers conversation events to locally connected room members
#[derive(Clone)]
pub struct RoomBroadcaster {
    connections: Arc<ConnectionManager>,
    /// Set once the relay exists; the relay itself owns a broadcaster
    relay: Arc<OnceLock<Weak<RoomRelay>>>,
}

impl RoomBroadcaster {
    #[must_use]
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self {
            connections,
            relay: Arc::new(OnceLock::new()),
        }
    }

    /// Rooms emptied by a departure get unfollowed on `relay`
    pub fn attach_relay(&self, relay: &Arc<RoomRelay>) {
        if self.relay.set(Arc::downgrade(relay)).is_err() {
            tracing::debug!("Room relay already attached");
        }
    }

    /// Fan out `event` to its room; returns the number of deliveries
    pub fn dispatch(&self, event: &ConversationEvent) -> usize {
        let room = event.room();
        let exclude = self.connections.user_connections_in_room(event.actor(), &room);
        let frame = GatewayMessage::event(event.name(), room_event_payload(event));

        let sent = self.connections.broadcast_to_room(&room, &frame, &exclude);

        tracing::debug!(
            room = %room,
            event_type = event.name(),
            sent = sent,
            excluded = exclude.len(),
            "Room event dispatched"
        );

        sent
    }

    /// After `participant:left`, drop the leaver's connections from the room
    ///
    /// Returns true when the room has no local member left.
    pub fn release_departed(&self, event: &ConversationEvent) -> bool {
        let ConversationEvent::ParticipantLeft(left) = event else {
            return false;
        };
        self.connections.evict_user_from_room(left.user_id, &event.room())
    }
}

#[async_trait]
impl EventPublisher for RoomBroadcaster {
    async fn publish(&self, event: &ConversationEvent) -> RepoResult<()> {
        self.dispatch(event);
        if self.release_departed(event) {
            if let Some(relay) = self.relay.get().and_then(Weak::upgrade) {
                relay.release_room(&event.room()).await;
            }
        }
        Ok(())
    }
}
