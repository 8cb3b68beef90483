//! Redis Pub/Sub module.
//!
//! Cross-instance relay for conversation room events.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{PubSubChannel, CONVERSATION_CHANNEL_PREFIX};
pub use publisher::{PubSubEvent, Publisher};
pub use subscriber::{RelayedEvent, RoomSubscriber, SubscriberConfig, SubscriberError, SubscriberResult};
