//! Wire protocol: `{op, t, s, d}` frames over text WebSocket messages

mod close_codes;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::{ClientCommand, GatewayMessage};
pub use opcodes::OpCode;
pub use payloads::{
    HelloPayload, IdentifyPayload, IdentifyProperties, RoomPayload, SendMessagePayload,
};
