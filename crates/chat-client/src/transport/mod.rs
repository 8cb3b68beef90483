//! Gateway transports
//!
//! The client speaks `GatewayMessage` frames over any `Transport`; a
//! `Connector` opens a fresh one per connection attempt.

mod ws;

#[cfg(test)]
pub(crate) mod memory;

pub use ws::{WsConnector, WsTransport};

use crate::error::ClientResult;
use async_trait::async_trait;
use chat_gateway::protocol::GatewayMessage;

/// What the gateway sent next
#[derive(Debug, Clone)]
pub enum Incoming {
    Frame(GatewayMessage),
    /// The socket ended, with the close code if the gateway sent one
    Closed(Option<u16>),
}

/// One open connection to a gateway
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, frame: GatewayMessage) -> ClientResult<()>;

    /// Next frame or the close; must be cancel safe
    async fn recv(&mut self) -> ClientResult<Incoming>;

    async fn close(&mut self);
}

/// Opens transports
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> ClientResult<Box<dyn Transport>>;
}
