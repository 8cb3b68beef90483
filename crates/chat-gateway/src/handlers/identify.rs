use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::events::{GatewayEventType, ReadyEvent};
use crate::protocol::{CloseCode, IdentifyPayload};
use crate::server::GatewayState;
use std::sync::Arc;

/// Bind the connection to the token's user and send `ready`
///
/// A second identify closes the socket; a bad token fails the handler,
/// which closes with `AuthenticationFailed`.
pub(super) async fn identify(
    state: &GatewayState,
    connection: &Arc<Connection>,
    payload: IdentifyPayload,
) -> HandlerResult<Option<CloseCode>> {
    let session_id = connection.session_id().to_string();
    if connection.is_authenticated() {
        tracing::warn!(session_id = %session_id, "Repeated identify");
        return Ok(Some(CloseCode::AlreadyAuthenticated));
    }

    let jwt = state.service_context().jwt_service();
    let user_id = jwt
        .authenticate(payload.bare_token())
        .map_err(|e| HandlerError::AuthenticationFailed(e.to_string()))?;

    state.connection_manager().authenticate_connection(&session_id, user_id).await;

    let ready = ReadyEvent::new(user_id, session_id.clone(), state.realtime().heartbeat_interval_ms);
    connection
        .dispatch(GatewayEventType::Ready.as_str(), serde_json::to_value(&ready)?)
        .await?;

    let props = payload.properties.unwrap_or_default();
    tracing::info!(
        session_id = %session_id,
        user_id = %user_id,
        client = props.browser.as_deref().unwrap_or("unknown"),
        os = props.os.as_deref().unwrap_or("unknown"),
        "Identified"
    );
    Ok(None)
}
