//! # chat-client
//!
//! Consumer side of the gateway: one persistent connection per process,
//! automatic reconnect with backoff, an offline send queue flushed in
//! order, and room re-join after every reconnect.
//!
//! ```no_run
//! use chat_client::{ClientConfig, ClientHandle, WsConnector};
//!
//! # async fn demo(token: String, room: String) -> Result<(), chat_client::ClientError> {
//! let client = ClientHandle::spawn(WsConnector::new("ws://127.0.0.1:8081/gateway"), ClientConfig::new(token));
//! client.join_room(room.clone()).await?;
//! let nonce = client.send_message(room, "Hi").await?;
//! println!("queued {nonce}, status: {}", client.status());
//! # Ok(())
//! # }
//! ```

mod backoff;
mod client;
mod error;
mod status;
pub mod transport;

pub use backoff::BackoffPolicy;
pub use client::{ClientConfig, ClientEvent, ClientHandle};
pub use error::{ClientError, ClientResult};
pub use status::{ClientStatus, ConnectionStatus};
pub use transport::{Connector, Incoming, Transport, WsConnector};
