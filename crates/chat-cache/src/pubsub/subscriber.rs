//! Redis Pub/Sub subscriber for conversation rooms.
//!
//! One connection per gateway instance. A room is followed while it has a
//! local member, and the followed set is replayed after every reconnect, so
//! callers never re-follow after an outage.

use crate::pubsub::{PubSubChannel, PubSubEvent};
use futures_util::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Pub/Sub connection dropped")]
    Disconnected,

    #[error("Subscriber has shut down")]
    Closed,
}

pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// An envelope received on a room channel
#[derive(Debug, Clone)]
pub struct RelayedEvent {
    /// Room key taken from the channel name
    pub room: String,
    pub envelope: PubSubEvent,
}

impl RelayedEvent {
    /// `None` for non-room channels and payloads that are not envelopes
    fn decode(channel: &str, payload: &str) -> Option<Self> {
        let room = PubSubChannel::parse(channel)?.room_key().to_string();
        match serde_json::from_str::<PubSubEvent>(payload) {
            Ok(envelope) => Some(Self { room, envelope }),
            Err(e) => {
                tracing::warn!(channel, error = %e, "Dropping undecodable relay payload");
                None
            }
        }
    }

    /// The channel and the event inside agree on the room
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.envelope.event.room() == self.room
    }
}

#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub redis_url: String,
    /// Relayed events buffered per receiver
    pub buffer: usize,
    /// First reconnect delay; doubles per failure up to `max_reconnect_delay`
    pub reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
}

impl SubscriberConfig {
    #[must_use]
    pub fn from_config(redis: &chat_common::RedisConfig, realtime: &chat_common::RealtimeConfig) -> Self {
        Self {
            redis_url: redis.url.clone(),
            reconnect_delay: Duration::from_millis(realtime.subscriber_reconnect_delay_ms),
            ..Self::default()
        }
    }

    fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_reconnect_delay)
    }
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            buffer: 1024,
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
enum Control {
    Follow(String),
    Unfollow(String),
    Shutdown,
}

/// Follows room channels and rebroadcasts their envelopes in-process
pub struct RoomSubscriber {
    followed: Arc<RwLock<HashSet<String>>>,
    events: broadcast::Sender<RelayedEvent>,
    control: mpsc::Sender<Control>,
}

impl RoomSubscriber {
    /// Start the background connection; must be called inside a Tokio runtime
    #[must_use]
    pub fn spawn(config: SubscriberConfig) -> Self {
        let (events, _) = broadcast::channel(config.buffer.max(1));
        let (control, control_rx) = mpsc::channel(64);
        let followed = Arc::new(RwLock::new(HashSet::new()));

        tokio::spawn(run(config, followed.clone(), events.clone(), control_rx));

        Self {
            followed,
            events,
            control,
        }
    }

    /// Start receiving `room`'s events
    ///
    /// The room is recorded before the command is queued, so a reconnect in
    /// between still subscribes it.
    pub async fn follow(&self, room: &str) -> SubscriberResult<()> {
        self.followed.write().await.insert(room.to_string());
        self.send(Control::Follow(room.to_string())).await
    }

    pub async fn unfollow(&self, room: &str) -> SubscriberResult<()> {
        self.followed.write().await.remove(room);
        self.send(Control::Unfollow(room.to_string())).await
    }

    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<RelayedEvent> {
        self.events.subscribe()
    }

    pub async fn followed_rooms(&self) -> Vec<String> {
        self.followed.read().await.iter().cloned().collect()
    }

    pub async fn shutdown(&self) -> SubscriberResult<()> {
        self.send(Control::Shutdown).await
    }

    async fn send(&self, control: Control) -> SubscriberResult<()> {
        self.control.send(control).await.map_err(|_| SubscriberError::Closed)
    }
}

async fn run(
    config: SubscriberConfig,
    followed: Arc<RwLock<HashSet<String>>>,
    events: broadcast::Sender<RelayedEvent>,
    mut control_rx: mpsc::Receiver<Control>,
) {
    let mut delay = config.reconnect_delay;
    loop {
        match session(&config, &followed, &events, &mut control_rx, &mut delay).await {
            Ok(()) => break,
            Err(e) => {
                tracing::error!(error = %e, delay_ms = delay.as_millis() as u64, "Room subscriber lost Redis, reconnecting");
                tokio::time::sleep(delay).await;
                delay = config.next_delay(delay);
            }
        }
    }
    tracing::info!("Room subscriber stopped");
}

/// One connection's lifetime; `Ok` means shut down
async fn session(
    config: &SubscriberConfig,
    followed: &RwLock<HashSet<String>>,
    events: &broadcast::Sender<RelayedEvent>,
    control_rx: &mut mpsc::Receiver<Control>,
    delay: &mut Duration,
) -> SubscriberResult<()> {
    let client = redis::Client::open(config.redis_url.as_str())?;
    let mut pubsub = client.get_async_pubsub().await?;

    let rooms: Vec<String> = followed.read().await.iter().cloned().collect();
    for room in &rooms {
        pubsub.subscribe(PubSubChannel::room(room).name()).await?;
    }
    *delay = config.reconnect_delay;
    tracing::info!(rooms = rooms.len(), "Room subscriber connected");

    loop {
        // The message stream borrows the connection; release it to (un)subscribe
        let control = {
            let mut stream = pubsub.on_message();
            loop {
                tokio::select! {
                    msg = stream.next() => {
                        let Some(msg) = msg else {
                            return Err(SubscriberError::Disconnected);
                        };
                        let payload: String = match msg.get_payload() {
                            Ok(payload) => payload,
                            Err(e) => {
                                tracing::debug!(error = %e, "Skipping non-text Pub/Sub payload");
                                continue;
                            }
                        };
                        if let Some(relayed) = RelayedEvent::decode(msg.get_channel_name(), &payload) {
                            // No receivers is fine
                            let _ = events.send(relayed);
                        }
                    }
                    control = control_rx.recv() => break control,
                }
            }
        };

        match control {
            Some(Control::Follow(room)) => {
                pubsub.subscribe(PubSubChannel::room(&room).name()).await?;
                tracing::debug!(room = %room, "Following room");
            }
            Some(Control::Unfollow(room)) => {
                pubsub.unsubscribe(PubSubChannel::room(&room).name()).await?;
                tracing::debug!(room = %room, "Unfollowed room");
            }
            Some(Control::Shutdown) | None => return Ok(()),
        }
    }
}
