//! Delivery client
//!
//! A background task owns the connection. It reconnects with backoff when
//! the socket drops, keeps sends in a FIFO queue until the gateway acks or
//! rejects them, and re-joins every room after each successful identify.
//! A send written to a connection that dies before its ack is sent again,
//! so delivery is at-least-once per nonce.

use crate::backoff::BackoffPolicy;
use crate::error::{ClientError, ClientResult};
use crate::status::{ClientStatus, ConnectionStatus};
use crate::transport::{Connector, Incoming, Transport};
use chat_core::{ConversationId, UserId};
use chat_gateway::events::{
    GatewayEventType, MessageAckEvent, MessageRejectedEvent, ReadyEvent, RoomEvent, RoomRejectedEvent,
};
use chat_gateway::protocol::{GatewayMessage, HelloPayload, OpCode, SendMessagePayload};
use chat_service::dto::MessageResponse;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};

/// Client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Access token sent in Identify
    pub token: String,
    pub backoff: BackoffPolicy,
    /// Hello through READY must finish within this
    pub handshake_timeout: Duration,
    pub command_buffer: usize,
    pub event_buffer: usize,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            backoff: BackoffPolicy::default(),
            handshake_timeout: Duration::from_secs(10),
            command_buffer: 256,
            event_buffer: 256,
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

/// What the client reports to the application
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Identified on a new connection
    Ready { user_id: UserId, session_id: String },
    RoomJoined { room_id: String },
    /// Join refused; the room is dropped from the re-join set
    RoomRejected { room_id: String, code: String },
    MessageAcked { nonce: Option<String>, message: MessageResponse },
    MessageRejected { nonce: Option<String>, room_id: String, code: String, message: String },
    /// A conversation event delivered to a joined room
    Room { event: String, data: Value },
    Disconnected { reason: String },
    /// Retries exhausted or credentials refused
    Failed { reason: String },
}

#[derive(Debug)]
enum Command {
    Join(String),
    Leave(String),
    Send(SendMessagePayload),
    Reconnect,
    Close,
}

/// Handle to a running delivery client; cheap to clone
#[derive(Clone)]
pub struct ClientHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<ClientStatus>,
    events: broadcast::Sender<ClientEvent>,
}

impl ClientHandle {
    /// Start the client task; must be called inside a Tokio runtime
    pub fn spawn<C: Connector>(connector: C, config: ClientConfig) -> Self {
        let (commands, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (status_tx, status) = watch::channel(ClientStatus::default());
        let (events, _) = broadcast::channel(config.event_buffer.max(1));

        let worker = Worker {
            connector,
            config,
            commands: command_rx,
            status: status_tx,
            events: events.clone(),
            rooms: Vec::new(),
            queue: VecDeque::new(),
            in_flight: VecDeque::new(),
            attempt: 0,
        };
        tokio::spawn(worker.run());

        Self {
            commands,
            status,
            events,
        }
    }

    /// Join `room_id` now and after every reconnect
    pub async fn join_room(&self, room_id: impl Into<String>) -> ClientResult<()> {
        self.command(Command::Join(canonical_room(room_id.into()))).await
    }

    pub async fn leave_room(&self, room_id: impl Into<String>) -> ClientResult<()> {
        self.command(Command::Leave(canonical_room(room_id.into()))).await
    }

    /// Queue a text message; returns the nonce its ack or rejection carries
    pub async fn send_message(&self, room_id: impl Into<String>, content: impl Into<String>) -> ClientResult<String> {
        self.send(SendMessagePayload::text(room_id, content)).await
    }

    /// Queue `payload`, assigning a nonce if it has none
    pub async fn send(&self, mut payload: SendMessagePayload) -> ClientResult<String> {
        let nonce = payload
            .nonce
            .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .clone();
        self.command(Command::Send(payload)).await?;
        Ok(nonce)
    }

    /// Retry now; resets the attempt count after `Failed`
    pub async fn reconnect(&self) -> ClientResult<()> {
        self.command(Command::Reconnect).await
    }

    /// Close the connection and stop the task
    pub async fn close(&self) -> ClientResult<()> {
        self.command(Command::Close).await
    }

    #[must_use]
    pub fn status(&self) -> ClientStatus {
        *self.status.borrow()
    }

    /// Receiver that sees every status change
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<ClientStatus> {
        self.status.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    async fn command(&self, command: Command) -> ClientResult<()> {
        self.commands.send(command).await.map_err(|_| ClientError::Closed)
    }
}

/// How a connection ended
enum Outcome {
    /// The application closed the client
    Closed,
    /// Worth retrying
    Dropped(String),
    /// Retrying with the same token cannot help
    Fatal(String),
}

impl From<ClientError> for Outcome {
    fn from(err: ClientError) -> Self {
        if err.is_retryable() {
            Self::Dropped(err.to_string())
        } else {
            Self::Fatal(err.to_string())
        }
    }
}

struct Worker<C> {
    connector: C,
    config: ClientConfig,
    commands: mpsc::Receiver<Command>,
    status: watch::Sender<ClientStatus>,
    events: broadcast::Sender<ClientEvent>,
    /// Rooms to hold, in join order
    rooms: Vec<String>,
    /// Not yet written to a live connection
    queue: VecDeque<SendMessagePayload>,
    /// Written, waiting for `message:ack` or `message:rejected`; write order
    in_flight: VecDeque<SendMessagePayload>,
    attempt: u32,
}

impl<C: Connector> Worker<C> {
    async fn run(mut self) {
        loop {
            let outcome = match self.connect().await {
                Ok((transport, heartbeat)) => {
                    self.attempt = 0;
                    self.set_connection(ConnectionStatus::Connected);
                    self.session(transport, heartbeat).await
                }
                Err(e) => Outcome::from(e),
            };

            let keep_going = match outcome {
                Outcome::Closed => false,
                Outcome::Fatal(reason) => self.wait_for_reconnect(reason).await,
                Outcome::Dropped(reason) => {
                    self.attempt += 1;
                    if self.config.backoff.is_exhausted(self.attempt) {
                        self.wait_for_reconnect(reason).await
                    } else {
                        tracing::info!(attempt = self.attempt, reason = %reason, "Connection lost, retrying");
                        self.set_connection(ConnectionStatus::Reconnecting { attempt: self.attempt });
                        self.emit(ClientEvent::Disconnected { reason });
                        let delay = self.config.backoff.delay(self.attempt);
                        self.pause(delay).await
                    }
                }
            };

            if !keep_going {
                break;
            }
        }

        if self.pending() > 0 {
            tracing::warn!(
                queued = self.queue.len(),
                unacked = self.in_flight.len(),
                "Client closed with unconfirmed messages"
            );
        }
        self.set_connection(ConnectionStatus::Closed);
    }

    async fn connect(&mut self) -> ClientResult<(Box<dyn Transport>, Duration)> {
        let mut transport = self.connector.connect().await?;
        let heartbeat = tokio::time::timeout(self.config.handshake_timeout, self.handshake(transport.as_mut()))
            .await
            .map_err(|_| ClientError::HandshakeTimeout)??;
        Ok((transport, heartbeat))
    }

    /// Hello, Identify, READY; returns the heartbeat interval
    async fn handshake(&self, transport: &mut dyn Transport) -> ClientResult<Duration> {
        let hello = match transport.recv().await? {
            Incoming::Frame(frame) if frame.op == OpCode::Hello => frame,
            Incoming::Frame(frame) => return Err(ClientError::Protocol(format!("expected Hello, got {frame}"))),
            Incoming::Closed(code) => return Err(ClientError::from_close(code)),
        };
        let interval = hello
            .data::<HelloPayload>()
            .map_or(HelloPayload::DEFAULT_HEARTBEAT_INTERVAL, |h| h.heartbeat_interval);

        transport
            .send(GatewayMessage::identify(format!("Bearer {}", self.config.token)))
            .await?;

        loop {
            match transport.recv().await? {
                Incoming::Frame(frame) if frame.is_event(GatewayEventType::Ready.as_str()) => {
                    let ready = frame
                        .data::<ReadyEvent>()
                        .ok_or_else(|| ClientError::Protocol("malformed READY".to_string()))?;
                    tracing::info!(user_id = %ready.user_id, session_id = %ready.session_id, "Identified");
                    self.emit(ClientEvent::Ready {
                        user_id: ready.user_id,
                        session_id: ready.session_id,
                    });
                    return Ok(Duration::from_millis(interval.max(1)));
                }
                Incoming::Frame(_) => continue,
                Incoming::Closed(code) => return Err(ClientError::from_close(code)),
            }
        }
    }

    async fn session(&mut self, mut transport: Box<dyn Transport>, heartbeat: Duration) -> Outcome {
        for room in self.rooms.clone() {
            if let Err(e) = transport.send(GatewayMessage::join_room(room)).await {
                return Outcome::from(e);
            }
        }
        self.requeue_unacked();
        if let Err(e) = self.flush(transport.as_mut()).await {
            return Outcome::from(e);
        }

        let mut ticker = tokio::time::interval_at(Instant::now() + heartbeat, heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_sequence = None;

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let result = match command {
                        None | Some(Command::Close) => {
                            transport.close().await;
                            return Outcome::Closed;
                        }
                        Some(Command::Reconnect) => Ok(()),
                        Some(Command::Join(room)) => {
                            self.add_room(&room);
                            transport.send(GatewayMessage::join_room(room)).await
                        }
                        Some(Command::Leave(room)) => {
                            self.remove_room(&room);
                            transport.send(GatewayMessage::leave_room(room)).await
                        }
                        Some(Command::Send(payload)) => {
                            self.enqueue(payload);
                            self.flush(transport.as_mut()).await
                        }
                    };
                    if let Err(e) = result {
                        return Outcome::from(e);
                    }
                }
                incoming = transport.recv() => match incoming {
                    Ok(Incoming::Frame(frame)) => {
                        if frame.s.is_some() {
                            last_sequence = frame.s;
                        }
                        if frame.op == OpCode::Reconnect {
                            return Outcome::Dropped("gateway requested reconnect".to_string());
                        }
                        self.handle_frame(frame);
                    }
                    Ok(Incoming::Closed(code)) => return Outcome::from(ClientError::from_close(code)),
                    Err(e) => return Outcome::from(e),
                },
                _ = ticker.tick() => {
                    if let Err(e) = transport.send(GatewayMessage::heartbeat(last_sequence)).await {
                        return Outcome::from(e);
                    }
                }
            }
        }
    }

    /// Send queued messages oldest first; each moves to `in_flight` once written
    async fn flush(&mut self, transport: &mut dyn Transport) -> ClientResult<()> {
        while let Some(payload) = self.queue.front() {
            transport.send(GatewayMessage::send_message(payload)).await?;
            if let Some(written) = self.queue.pop_front() {
                self.in_flight.push_back(written);
            }
        }
        Ok(())
    }

    /// Put sends the last connection never confirmed back ahead of newer ones
    fn requeue_unacked(&mut self) {
        if self.in_flight.is_empty() {
            return;
        }
        tracing::info!(unacked = self.in_flight.len(), "Resending unconfirmed messages");
        while let Some(payload) = self.in_flight.pop_back() {
            self.queue.push_front(payload);
        }
    }

    /// Drop the in-flight send the gateway just answered
    fn settle(&mut self, nonce: Option<&str>) {
        let Some(nonce) = nonce else {
            return;
        };
        if let Some(index) = self.in_flight.iter().position(|p| p.nonce.as_deref() == Some(nonce)) {
            self.in_flight.remove(index);
            self.publish_queued();
        }
    }

    fn handle_frame(&mut self, frame: GatewayMessage) {
        if frame.op != OpCode::Dispatch {
            return;
        }
        let Some(name) = frame.t.clone() else {
            return;
        };

        let event = match GatewayEventType::parse(&name) {
            Some(GatewayEventType::RoomJoined) => frame.data::<RoomEvent>().map(|e| ClientEvent::RoomJoined {
                room_id: e.room_id,
            }),
            Some(GatewayEventType::RoomRejected) => frame.data::<RoomRejectedEvent>().map(|e| {
                tracing::warn!(room_id = %e.room_id, code = %e.code, "Room join rejected");
                self.remove_room(&e.room_id);
                ClientEvent::RoomRejected {
                    room_id: e.room_id,
                    code: e.code,
                }
            }),
            Some(GatewayEventType::MessageAck) => frame.data::<MessageAckEvent>().map(|e| {
                self.settle(e.nonce.as_deref());
                ClientEvent::MessageAcked {
                    nonce: e.nonce,
                    message: e.message,
                }
            }),
            Some(GatewayEventType::MessageRejected) => frame.data::<MessageRejectedEvent>().map(|e| {
                self.settle(e.nonce.as_deref());
                ClientEvent::MessageRejected {
                    nonce: e.nonce,
                    room_id: e.room_id,
                    code: e.code,
                    message: e.message,
                }
            }),
            Some(GatewayEventType::Ready | GatewayEventType::RoomLeft) => None,
            None => Some(ClientEvent::Room {
                event: name,
                data: frame.d.unwrap_or(Value::Null),
            }),
        };

        if let Some(event) = event {
            self.emit(event);
        }
    }

    /// Sleep before the next attempt while still taking commands.
    /// Returns false once the application closes the client.
    async fn pause(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return true,
                command = self.commands.recv() => match command {
                    None | Some(Command::Close) => return false,
                    Some(Command::Reconnect) => return true,
                    Some(command) => self.hold(command),
                },
            }
        }
    }

    /// Park in `Failed` until the application asks for a reconnect
    async fn wait_for_reconnect(&mut self, reason: String) -> bool {
        tracing::warn!(attempts = self.attempt, reason = %reason, "Giving up on the gateway");
        self.set_connection(ConnectionStatus::Failed);
        self.emit(ClientEvent::Failed { reason });

        loop {
            match self.commands.recv().await {
                None | Some(Command::Close) => return false,
                Some(Command::Reconnect) => {
                    self.attempt = 0;
                    self.set_connection(ConnectionStatus::Connecting);
                    return true;
                }
                Some(command) => self.hold(command),
            }
        }
    }

    /// Apply a command while offline
    fn hold(&mut self, command: Command) {
        match command {
            Command::Join(room) => self.add_room(&room),
            Command::Leave(room) => self.remove_room(&room),
            Command::Send(payload) => self.enqueue(payload),
            Command::Reconnect | Command::Close => {}
        }
    }

    fn add_room(&mut self, room: &str) {
        if !self.rooms.iter().any(|r| r == room) {
            self.rooms.push(room.to_string());
        }
    }

    fn remove_room(&mut self, room: &str) {
        self.rooms.retain(|r| r != room);
    }

    fn enqueue(&mut self, payload: SendMessagePayload) {
        self.queue.push_back(payload);
        self.publish_queued();
    }

    fn pending(&self) -> usize {
        self.queue.len() + self.in_flight.len()
    }

    fn publish_queued(&self) {
        let queued = self.pending();
        self.status.send_modify(|s| s.queued = queued);
    }

    fn set_connection(&self, connection: ConnectionStatus) {
        self.status.send_modify(|s| s.connection = connection);
    }

    fn emit(&self, event: ClientEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

/// Conversation ids in the gateway's lowercase form; anything else as given
fn canonical_room(room: String) -> String {
    ConversationId::parse(&room).map_or(room, |id| id.to_string())
}
