//! # chat-cache
//!
//! Redis connection pool and the pub/sub relay that carries conversation
//! events between gateway instances.
//!
//! ## Example
//!
//! ```ignore
//! use chat_cache::{Publisher, RedisPool, RedisPoolConfig, RoomSubscriber, SubscriberConfig};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let publisher = Publisher::new(pool).with_origin("gateway-1");
//! publisher.publish_event(&event).await?;
//!
//! let subscriber = RoomSubscriber::spawn(SubscriberConfig::default());
//! subscriber.follow(&room_key).await?;
//! let mut rx = subscriber.events();
//! ```

pub mod pool;
pub mod pubsub;

pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};
pub use pubsub::{
    PubSubChannel, PubSubEvent, Publisher, RelayedEvent, RoomSubscriber, SubscriberConfig,
    SubscriberError, SubscriberResult, CONVERSATION_CHANNEL_PREFIX,
};
