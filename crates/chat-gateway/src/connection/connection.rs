//! Individual WebSocket connection
//!
//! Represents a single WebSocket connection, its identity and the rooms it
//! has joined.

use crate::protocol::{CloseCode, GatewayMessage};
use chat_core::UserId;
use parking_lot::RwLock as SyncRwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Socket open, waiting for Identify
    Connecting,
    /// Identified; may join rooms
    Authenticated,
    /// Socket closed
    Disconnected,
}

/// Item queued for the socket writer task
#[derive(Debug, Clone)]
pub enum Outbound {
    Frame(GatewayMessage),
    /// Send a close frame with this code, then stop writing
    Close(CloseCode),
}

/// A single WebSocket connection
pub struct Connection {
    /// Unique connection id
    session_id: String,

    /// Authenticated user (None until Identify)
    user_id: SyncRwLock<Option<UserId>>,

    state: RwLock<ConnectionState>,

    /// Channel to the socket writer task
    sender: mpsc::Sender<Outbound>,

    /// Last dispatch sequence number sent
    sequence: AtomicU64,

    /// Last heartbeat received
    last_heartbeat: RwLock<Instant>,

    /// Room keys this connection has joined
    rooms: SyncRwLock<HashSet<String>>,

    created_at: Instant,
}

impl Connection {
    pub fn new(session_id: String, sender: mpsc::Sender<Outbound>) -> Arc<Self> {
        Arc::new(Self {
            session_id,
            user_id: SyncRwLock::new(None),
            state: RwLock::new(ConnectionState::Connecting),
            sender,
            sequence: AtomicU64::new(0),
            last_heartbeat: RwLock::new(Instant::now()),
            rooms: SyncRwLock::new(HashSet::new()),
            created_at: Instant::now(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The authenticated user, if any
    pub fn user_id(&self) -> Option<UserId> {
        *self.user_id.read()
    }

    pub(crate) fn set_user_id(&self, user_id: UserId) {
        *self.user_id.write() = Some(user_id);
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.read().is_some()
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn set_state(&self, state: ConnectionState) {
        *self.state.write().await = state;
    }

    /// Get the next sequence number
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Record a heartbeat received
    pub async fn record_heartbeat(&self) {
        *self.last_heartbeat.write().await = Instant::now();
    }

    pub async fn time_since_heartbeat(&self) -> std::time::Duration {
        self.last_heartbeat.read().await.elapsed()
    }

    /// Returns false if the room was already joined
    pub(crate) fn add_room(&self, room: &str) -> bool {
        self.rooms.write().insert(room.to_string())
    }

    /// Returns false if the room was not joined
    pub(crate) fn remove_room(&self, room: &str) -> bool {
        self.rooms.write().remove(room)
    }

    pub fn rooms(&self) -> Vec<String> {
        self.rooms.read().iter().cloned().collect()
    }

    pub fn in_room(&self, room: &str) -> bool {
        self.rooms.read().contains(room)
    }

    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Queue a frame, waiting for buffer space
    pub async fn send(&self, message: GatewayMessage) -> Result<(), mpsc::error::SendError<Outbound>> {
        self.sender.send(Outbound::Frame(message)).await
    }

    /// Queue a dispatch stamped with this connection's next sequence
    pub async fn dispatch(
        &self,
        event_type: &str,
        data: serde_json::Value,
    ) -> Result<(), mpsc::error::SendError<Outbound>> {
        let message = GatewayMessage::dispatch(event_type, self.next_sequence(), data);
        self.send(message).await
    }

    /// Queue a frame without waiting
    pub fn try_send(&self, message: GatewayMessage) -> Result<(), mpsc::error::TrySendError<Outbound>> {
        self.sender.try_send(Outbound::Frame(message))
    }

    /// Ask the writer to close the socket with `code`
    pub async fn close(&self, code: CloseCode) {
        let _ = self.sender.send(Outbound::Close(code)).await;
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id())
            .field("rooms", &self.rooms.read().len())
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .finish()
    }
}
