//! WebSocket transport over tokio-tungstenite

use super::{Connector, Incoming, Transport};
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use chat_gateway::protocol::GatewayMessage;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Connects to a gateway URL such as `ws://127.0.0.1:8081/gateway`
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> ClientResult<Box<dyn Transport>> {
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;

        tracing::debug!(url = %self.url, "WebSocket connected");
        Ok(Box::new(WsTransport { stream }))
    }
}

pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, frame: GatewayMessage) -> ClientResult<()> {
        let json = frame.to_json().map_err(|e| ClientError::Protocol(e.to_string()))?;
        self.stream
            .send(Message::Text(json))
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> ClientResult<Incoming> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return GatewayMessage::from_json(&text)
                        .map(Incoming::Frame)
                        .map_err(|e| ClientError::Protocol(e.to_string()));
                }
                Some(Ok(Message::Close(frame))) => {
                    return Ok(Incoming::Closed(frame.map(|f| u16::from(f.code))));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(ClientError::Transport(e.to_string())),
                None => return Ok(Incoming::Closed(None)),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "WebSocket close failed");
        }
    }
}
