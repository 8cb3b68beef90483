//! WebSocket handler
//!
//! Drives one socket: Hello, the identify deadline, heartbeats, frame
//! dispatch, and cleanup on disconnect.

use crate::connection::{Connection, Outbound};
use crate::handlers::MessageDispatcher;
use crate::protocol::{CloseCode, GatewayMessage, HelloPayload};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Time the writer gets to flush a close frame
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// WebSocket gateway handler
pub async fn gateway_handler(State(state): State<GatewayState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let session_id = uuid::Uuid::new_v4().to_string();
    let realtime = state.realtime().clone();

    let (tx, mut rx) = mpsc::channel::<Outbound>(realtime.outbound_buffer.max(1));
    let connection = state.connection_manager().add_connection(session_id.clone(), tx);

    tracing::info!(session_id = %session_id, "WebSocket connection established");

    let (mut ws_sink, mut ws_stream) = socket.split();

    let hello = GatewayMessage::hello(HelloPayload::with_interval(realtime.heartbeat_interval_ms));
    if let Ok(json) = hello.to_json() {
        if ws_sink.send(Message::Text(json.into())).await.is_err() {
            tracing::warn!(session_id = %session_id, "Failed to send Hello message");
            cleanup_connection(&state, &session_id).await;
            return;
        }
    }

    let state_recv = state.clone();
    let session_id_recv = session_id.clone();
    let connection_recv = connection.clone();

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(close_code) = handle_text_message(&state_recv, &connection_recv, &text).await {
                        return Some(close_code);
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(session_id = %session_id_recv, "Binary messages not supported");
                    return Some(CloseCode::DecodeError);
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id_recv, "Client closed connection");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id_recv, error = %e, "WebSocket error");
                    return None;
                }
            }
        }
        None
    });

    let session_id_send = session_id.clone();

    let mut send_task = tokio::spawn(async move {
        while let Some(outbound) = rx.recv().await {
            match outbound {
                Outbound::Frame(msg) => {
                    let Ok(json) = msg.to_json() else {
                        continue;
                    };
                    if ws_sink.send(Message::Text(json.into())).await.is_err() {
                        tracing::warn!(session_id = %session_id_send, "Failed to send message to WebSocket");
                        break;
                    }
                }
                Outbound::Close(code) => {
                    let (code, reason) = GatewayMessage::close_frame(code);
                    let frame = CloseFrame {
                        code,
                        reason: reason.into(),
                    };
                    let _ = ws_sink.send(Message::Close(Some(frame))).await;
                    break;
                }
            }
        }

        let _ = ws_sink.close().await;
    });

    let session_id_hb = session_id.clone();
    let connection_hb = connection.clone();
    let heartbeat_interval = Duration::from_millis(realtime.heartbeat_interval_ms.max(1));

    let mut heartbeat_task = tokio::spawn(async move {
        let mut check_interval = interval(heartbeat_interval / 2);
        let timeout = heartbeat_interval * 2;

        loop {
            check_interval.tick().await;

            let time_since = connection_hb.time_since_heartbeat().await;
            if time_since > timeout {
                tracing::warn!(
                    session_id = %session_id_hb,
                    time_since_ms = time_since.as_millis(),
                    "Connection timed out (no heartbeat)"
                );
                return CloseCode::SessionTimeout;
            }
        }
    });

    let connection_auth = connection.clone();
    let auth_timeout = Duration::from_secs(realtime.auth_timeout_secs);
    let auth_deadline = async move {
        tokio::time::sleep(auth_timeout).await;
        if connection_auth.is_authenticated() {
            std::future::pending::<()>().await;
        }
        CloseCode::SessionTimeout
    };
    tokio::pin!(auth_deadline);

    let mut writer_done = false;
    let close_code = tokio::select! {
        result = &mut recv_task => result.ok().flatten(),
        _ = &mut send_task => {
            writer_done = true;
            None
        }
        result = &mut heartbeat_task => result.ok(),
        code = &mut auth_deadline => {
            tracing::info!(session_id = %session_id, "Identify deadline passed");
            Some(code)
        }
    };

    if !writer_done {
        if let Some(code) = close_code {
            tracing::debug!(session_id = %session_id, close_code = %code, "Closing connection");
            connection.close(code).await;
            let _ = tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, &mut send_task).await;
        }
        send_task.abort();
    }
    recv_task.abort();
    heartbeat_task.abort();

    tracing::debug!(session_id = %session_id, age_secs = connection.age().as_secs(), "Connection ended");
    cleanup_connection(&state, &session_id).await;
}

/// Handle a text frame from the client; `Err` closes the connection
async fn handle_text_message(state: &GatewayState, connection: &Arc<Connection>, text: &str) -> Result<(), CloseCode> {
    let message = match GatewayMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(session_id = %connection.session_id(), error = %e, "Failed to parse message");
            return Err(CloseCode::DecodeError);
        }
    };

    tracing::trace!(session_id = %connection.session_id(), op = %message.op, "Received message");

    match MessageDispatcher::dispatch(state, connection, message).await {
        Ok(Some(close_code)) => Err(close_code),
        Ok(None) => Ok(()),
        Err(e) => {
            tracing::warn!(session_id = %connection.session_id(), error = %e, "Handler error");
            Err(e.to_close_code())
        }
    }
}

/// Drop the connection's room memberships; conversation membership is untouched
async fn cleanup_connection(state: &GatewayState, session_id: &str) {
    let emptied = state.connection_manager().remove_connection(session_id).await;

    if let Some(relay) = state.relay() {
        for room in &emptied {
            relay.release_room(room).await;
        }
    }

    tracing::info!(session_id = %session_id, rooms_released = emptied.len(), "Connection cleaned up");
}
