//! Gateway events
//!
//! Dispatches the gateway sends to clients.

mod event_types;
mod payloads;

pub use event_types::GatewayEventType;
pub use payloads::{
    room_event_payload, MessageAckEvent, MessageRejectedEvent, ReadyEvent, RoomEvent,
    RoomRejectedEvent,
};
