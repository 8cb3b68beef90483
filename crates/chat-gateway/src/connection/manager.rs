//! Connection manager
//!
//! Tracks every live connection on this instance, the user each one belongs
//! to and the rooms each one has joined. A user may hold any number of
//! connections; each joins rooms independently.

use super::{Connection, ConnectionState, Outbound};
use crate::events::GatewayEventType;
use crate::protocol::GatewayMessage;
use chat_core::UserId;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Manages all active WebSocket connections
pub struct ConnectionManager {
    /// Active connections by session id
    connections: DashMap<String, Arc<Connection>>,

    /// User id to session ids
    user_connections: DashMap<UserId, HashSet<String>>,

    /// Room key to session ids
    rooms: DashMap<String, HashSet<String>>,
}

impl ConnectionManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_connections: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection
    pub fn add_connection(&self, session_id: String, sender: mpsc::Sender<Outbound>) -> Arc<Connection> {
        let connection = Connection::new(session_id.clone(), sender);
        self.connections.insert(session_id.clone(), connection.clone());

        tracing::debug!(session_id = %session_id, "Connection added");

        connection
    }

    /// Remove a connection and its room memberships
    ///
    /// Returns the rooms that no longer have any local member. Conversation
    /// membership is untouched.
    pub async fn remove_connection(&self, session_id: &str) -> Vec<String> {
        let Some((_, connection)) = self.connections.remove(session_id) else {
            return Vec::new();
        };

        connection.set_state(ConnectionState::Disconnected).await;

        if let Some(user_id) = connection.user_id() {
            self.user_connections.alter(&user_id, |_, mut sessions| {
                sessions.remove(session_id);
                sessions
            });
            self.user_connections.remove_if(&user_id, |_, sessions| sessions.is_empty());
        }

        let mut emptied = Vec::new();
        for room in connection.rooms() {
            if self.detach(session_id, &room) {
                emptied.push(room);
            }
        }

        tracing::debug!(session_id = %session_id, rooms_emptied = emptied.len(), "Connection removed");

        emptied
    }

    pub fn get_connection(&self, session_id: &str) -> Option<Arc<Connection>> {
        self.connections.get(session_id).map(|r| r.clone())
    }

    /// Link a connection to a user
    pub async fn authenticate_connection(&self, session_id: &str, user_id: UserId) -> bool {
        let Some(connection) = self.get_connection(session_id) else {
            return false;
        };

        connection.set_user_id(user_id);
        connection.set_state(ConnectionState::Authenticated).await;

        self.user_connections
            .entry(user_id)
            .or_default()
            .insert(session_id.to_string());

        tracing::debug!(session_id = %session_id, user_id = %user_id, "Connection authenticated");

        true
    }

    /// Add a connection to a room
    ///
    /// Returns `Some(true)` when this is the room's first local member,
    /// `Some(false)` otherwise, and `None` for an unknown session.
    pub fn join_room(&self, session_id: &str, room: &str) -> Option<bool> {
        let connection = self.get_connection(session_id)?;
        connection.add_room(room);

        let mut members = self.rooms.entry(room.to_string()).or_default();
        let first = members.is_empty();
        members.insert(session_id.to_string());

        tracing::trace!(session_id = %session_id, room = %room, "Connection joined room");

        Some(first)
    }

    /// Remove a connection from a room
    ///
    /// Returns true when the room has no local member left.
    pub fn leave_room(&self, session_id: &str, room: &str) -> bool {
        if let Some(connection) = self.get_connection(session_id) {
            if !connection.remove_room(room) {
                return false;
            }
        }
        let emptied = self.detach(session_id, room);

        tracing::trace!(session_id = %session_id, room = %room, "Connection left room");

        emptied
    }

    /// Take every connection of `user_id` out of `room`, telling each with `room:left`
    ///
    /// Used once the user's participant record is gone. Returns true when
    /// the room has no local member left.
    pub fn evict_user_from_room(&self, user_id: UserId, room: &str) -> bool {
        let sessions = self.user_connections_in_room(user_id, room);
        if sessions.is_empty() {
            return false;
        }

        let notice = serde_json::json!({ "room_id": room });
        let mut emptied = false;
        for session_id in &sessions {
            emptied = self.leave_room(session_id, room);
            let Some(conn) = self.get_connection(session_id) else {
                continue;
            };
            let frame = GatewayMessage::dispatch(GatewayEventType::RoomLeft.as_str(), conn.next_sequence(), notice.clone());
            if let Err(e) = conn.try_send(frame) {
                tracing::warn!(session_id = %session_id, room = %room, error = %e, "Dropped room:left notice");
            }
        }

        tracing::debug!(user_id = %user_id, room = %room, evicted = sessions.len(), "Departed participant removed from room");

        emptied
    }

    fn detach(&self, session_id: &str, room: &str) -> bool {
        self.rooms.alter(room, |_, mut sessions| {
            sessions.remove(session_id);
            sessions
        });
        self.rooms.remove_if(room, |_, sessions| sessions.is_empty()).is_some()
    }

    pub fn get_user_connections(&self, user_id: UserId) -> Vec<Arc<Connection>> {
        self.user_connections
            .get(&user_id)
            .map(|sessions| {
                sessions
                    .iter()
                    .filter_map(|sid| self.connections.get(sid).map(|c| c.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Session ids in `room`
    pub fn room_connections(&self, room: &str) -> HashSet<String> {
        self.rooms.get(room).map(|r| r.clone()).unwrap_or_default()
    }

    /// Session ids of `user_id` that have joined `room`
    pub fn user_connections_in_room(&self, user_id: UserId, room: &str) -> HashSet<String> {
        let Some(members) = self.rooms.get(room) else {
            return HashSet::new();
        };
        self.user_connections
            .get(&user_id)
            .map(|sessions| sessions.intersection(&members).cloned().collect())
            .unwrap_or_default()
    }

    /// Deliver one frame to every connection in `room` except `exclude`
    ///
    /// Each recipient gets its own sequence number. Full or closed buffers
    /// are skipped. Returns the number of connections the frame was queued on.
    pub fn broadcast_to_room(&self, room: &str, message: &GatewayMessage, exclude: &HashSet<String>) -> usize {
        let members = self.room_connections(room);
        let mut sent = 0;

        for session_id in members.iter().filter(|sid| !exclude.contains(*sid)) {
            let Some(conn) = self.get_connection(session_id) else {
                continue;
            };

            let mut frame = message.clone();
            frame.s = Some(conn.next_sequence());

            match conn.try_send(frame) {
                Ok(()) => sent += 1,
                Err(e) => {
                    tracing::warn!(session_id = %session_id, room = %room, error = %e, "Dropped room frame");
                }
            }
        }

        tracing::trace!(room = %room, sent = sent, excluded = exclude.len(), "Room broadcast");

        sent
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of distinct authenticated users
    pub fn user_count(&self) -> usize {
        self.user_connections.len()
    }

    /// Number of rooms with at least one local member
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn has_session(&self, session_id: &str) -> bool {
        self.connections.contains_key(session_id)
    }

    /// Ask every connection to reconnect; used on shutdown
    pub fn broadcast_reconnect(&self) -> usize {
        self.connections
            .iter()
            .filter(|c| c.try_send(GatewayMessage::reconnect()).is_ok())
            .count()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("users", &self.user_connections.len())
            .field("rooms", &self.rooms.len())
            .finish()
    }
}
