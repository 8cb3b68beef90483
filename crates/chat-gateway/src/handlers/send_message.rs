//! Send Message handler (op 6)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::events::{GatewayEventType, MessageAckEvent, MessageRejectedEvent};
use crate::protocol::{CloseCode, SendMessagePayload};
use crate::server::GatewayState;
use chat_core::ConversationId;
use chat_service::dto::CreateMessageRequest;
use chat_service::{MessageService, ServiceError};
use std::sync::Arc;

pub struct SendMessageHandler;

impl SendMessageHandler {
    /// Persist the message through the message service
    ///
    /// The sender gets `message:ack` with the stored message; other room
    /// members receive `message:new` from the service's publish.
    pub async fn handle(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: SendMessagePayload,
    ) -> HandlerResult<Option<CloseCode>> {
        let user_id = connection.user_id().ok_or(HandlerError::NotAuthenticated)?;
        let SendMessagePayload {
            room_id,
            content,
            kind,
            reply_to,
            media_ref,
            nonce,
        } = payload;

        let Ok(conversation_id) = ConversationId::parse(&room_id) else {
            let err = ServiceError::not_found("Conversation", &room_id);
            Self::reject(connection, nonce, room_id, &err).await?;
            return Ok(None);
        };

        let request = CreateMessageRequest {
            content,
            kind,
            reply_to,
            media_ref,
            metadata: None,
        };

        match MessageService::new(state.service_context())
            .append_message(conversation_id, user_id, request)
            .await
        {
            Ok(message) => {
                let data = serde_json::to_value(MessageAckEvent { nonce, message })?;
                connection.dispatch(GatewayEventType::MessageAck.as_str(), data).await?;
            }
            Err(err) => {
                tracing::debug!(
                    session_id = %connection.session_id(),
                    conversation_id = %conversation_id,
                    error = %err,
                    "Message rejected"
                );
                Self::reject(connection, nonce, conversation_id.to_string(), &err).await?;
            }
        }

        Ok(None)
    }

    async fn reject(
        connection: &Connection,
        nonce: Option<String>,
        room_id: String,
        err: &ServiceError,
    ) -> HandlerResult<()> {
        let data = serde_json::to_value(MessageRejectedEvent {
            nonce,
            room_id,
            code: err.error_code().to_string(),
            message: err.to_string(),
        })?;
        connection.dispatch(GatewayEventType::MessageRejected.as_str(), data).await?;
        Ok(())
    }
}
