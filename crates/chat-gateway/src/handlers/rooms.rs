//! Join Room (op 3) and Leave Room (op 4)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::events::{GatewayEventType, RoomEvent, RoomRejectedEvent};
use crate::protocol::{CloseCode, RoomPayload};
use crate::server::GatewayState;
use chat_core::{ConversationId, DomainError};
use std::sync::Arc;

pub struct RoomHandler;

impl RoomHandler {
    /// Join a conversation room; only active participants are admitted
    pub async fn join(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: RoomPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let user_id = connection.user_id().ok_or(HandlerError::NotAuthenticated)?;

        let Ok(conversation_id) = ConversationId::parse(&payload.room_id) else {
            let unknown = DomainError::ConversationNotFound(ConversationId::from_uuid(uuid::Uuid::nil()));
            Self::reject(connection, payload.room_id, &unknown).await?;
            return Ok(None);
        };
        let room = conversation_id.to_string();

        let membership = state
            .service_context()
            .participant_repo()
            .find_active(conversation_id, user_id)
            .await;

        match membership {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::debug!(
                    session_id = %connection.session_id(),
                    user_id = %user_id,
                    room = %room,
                    "Join refused for non-participant"
                );
                Self::reject(connection, room, &DomainError::ConversationNotFound(conversation_id)).await?;
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(room = %room, error = %e, "Membership lookup failed");
                Self::reject(connection, room, &e).await?;
                return Ok(None);
            }
        }

        let first_local = state
            .connection_manager()
            .join_room(connection.session_id(), &room)
            .unwrap_or(false);

        if first_local {
            if let Some(relay) = state.relay() {
                if let Err(e) = relay.follow_room(&room).await {
                    tracing::warn!(room = %room, error = %e, "Failed to follow room relay channel");
                }
            }
        }

        let data = serde_json::to_value(RoomEvent { room_id: room.clone() })?;
        connection.dispatch(GatewayEventType::RoomJoined.as_str(), data).await?;

        tracing::debug!(session_id = %connection.session_id(), room = %room, "Joined room");

        Ok(None)
    }

    /// Leave a room; leaving a room never joined is a no-op
    pub async fn leave(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: RoomPayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let room = ConversationId::parse(&payload.room_id)
            .map(|id| id.to_string())
            .unwrap_or(payload.room_id);

        let emptied = state.connection_manager().leave_room(connection.session_id(), &room);

        if emptied {
            if let Some(relay) = state.relay() {
                relay.release_room(&room).await;
            }
        }

        let data = serde_json::to_value(RoomEvent { room_id: room })?;
        connection.dispatch(GatewayEventType::RoomLeft.as_str(), data).await?;

        Ok(None)
    }

    async fn reject(connection: &Connection, room_id: String, reason: &DomainError) -> HandlerResult<()> {
        let rejected = RoomRejectedEvent {
            room_id,
            code: reason.code().to_string(),
            message: if reason.is_not_found() {
                "Conversation not found".to_string()
            } else {
                "Unable to join room".to_string()
            },
        };
        let data = serde_json::to_value(rejected)?;
        connection.dispatch(GatewayEventType::RoomRejected.as_str(), data).await?;
        Ok(())
    }
}
