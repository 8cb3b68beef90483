//! Event broadcasting
//!
//! Local room fan-out plus the Redis relay that feeds it events persisted
//! through other instances.

mod relay;
mod room;

pub use relay::RoomRelay;
pub use room::RoomBroadcaster;
