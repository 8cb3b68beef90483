//! Client command handling

mod error;
mod identify;
mod rooms;
mod send_message;

pub use error::{HandlerError, HandlerResult};
pub use rooms::RoomHandler;
pub use send_message::SendMessageHandler;

use crate::connection::Connection;
use crate::protocol::{ClientCommand, CloseCode, GatewayMessage};
use crate::server::GatewayState;
use std::sync::Arc;

/// Routes client frames to their handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Handle one client frame; `Some(code)` closes the connection
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        message: GatewayMessage,
    ) -> HandlerResult<Option<CloseCode>> {
        let command = match message.command() {
            Ok(command) => command,
            Err(code) => {
                tracing::debug!(session_id = %connection.session_id(), op = %message.op, close_code = %code, "Refusing frame");
                return Ok(Some(code));
            }
        };

        if !connection.is_authenticated() && !command.allowed_before_identify() {
            tracing::debug!(session_id = %connection.session_id(), op = %message.op, "Op sent before identify");
            return Ok(Some(CloseCode::NotAuthenticated));
        }

        match command {
            ClientCommand::Heartbeat(last_seen) => {
                connection.record_heartbeat().await;
                tracing::trace!(
                    session_id = %connection.session_id(),
                    client_seq = ?last_seen,
                    server_seq = connection.current_sequence(),
                    "Heartbeat"
                );
                connection.send(GatewayMessage::heartbeat_ack()).await?;
                Ok(None)
            }
            ClientCommand::Identify(payload) => identify::identify(state, connection, payload).await,
            ClientCommand::JoinRoom(payload) => RoomHandler::join(state, connection, payload).await,
            ClientCommand::LeaveRoom(payload) => RoomHandler::leave(state, connection, payload).await,
            ClientCommand::SendMessage(payload) => SendMessageHandler::handle(state, connection, payload).await,
        }
    }
}
