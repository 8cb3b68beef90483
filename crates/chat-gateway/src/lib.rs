//! # chat-gateway
//!
//! WebSocket gateway for conversation rooms: bearer identify, room join and
//! leave, message send, and fan-out of persisted conversation events.

pub mod broadcast;
pub mod connection;
pub mod events;
pub mod handlers;
pub mod protocol;
pub mod server;

pub use server::{create_app, create_gateway_state, create_local_state, run, GatewayState};
