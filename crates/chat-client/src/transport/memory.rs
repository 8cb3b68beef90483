//! Channel-backed transport driven by a test acting as the gateway

use super::{Connector, Incoming, Transport};
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use chat_core::UserId;
use chat_gateway::events::ReadyEvent;
use chat_gateway::protocol::{GatewayMessage, HelloPayload, IdentifyPayload, OpCode};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Refuses the next `failures` attempts, then hands each accepted
/// connection's server side to the test
#[derive(Clone)]
pub(crate) struct MemoryConnector {
    failures: Arc<AtomicU32>,
    attempts: Arc<AtomicU32>,
    accepted: mpsc::UnboundedSender<ServerEnd>,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEnd>) {
        let (accepted, rx) = mpsc::unbounded_channel();
        let connector = Self {
            failures: Arc::new(AtomicU32::new(0)),
            attempts: Arc::new(AtomicU32::new(0)),
            accepted,
        };
        (connector, rx)
    }

    pub fn fail_next(&self, failures: u32) {
        self.failures.store(failures, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> ClientResult<Box<dyn Transport>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let refused = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(ClientError::Connect("connection refused".to_string()));
        }

        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, from_server) = mpsc::unbounded_channel();
        self.accepted
            .send(ServerEnd {
                rx: from_client,
                tx: to_client,
            })
            .map_err(|_| ClientError::Connect("test gateway gone".to_string()))?;

        Ok(Box::new(MemoryTransport {
            tx: to_server,
            rx: from_server,
        }))
    }
}

struct MemoryTransport {
    tx: mpsc::UnboundedSender<GatewayMessage>,
    rx: mpsc::UnboundedReceiver<Incoming>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, frame: GatewayMessage) -> ClientResult<()> {
        self.tx
            .send(frame)
            .map_err(|_| ClientError::Transport("peer dropped".to_string()))
    }

    async fn recv(&mut self) -> ClientResult<Incoming> {
        Ok(self.rx.recv().await.unwrap_or(Incoming::Closed(None)))
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}

/// The gateway's side of one connection; dropping it drops the connection
pub(crate) struct ServerEnd {
    rx: mpsc::UnboundedReceiver<GatewayMessage>,
    tx: mpsc::UnboundedSender<Incoming>,
}

impl ServerEnd {
    pub fn send(&self, frame: GatewayMessage) {
        let _ = self.tx.send(Incoming::Frame(frame));
    }

    pub fn close(&self, code: u16) {
        let _ = self.tx.send(Incoming::Closed(Some(code)));
    }

    pub async fn recv(&mut self) -> GatewayMessage {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("client hung up")
    }

    /// Next frame that is not a heartbeat
    pub async fn recv_op(&mut self) -> GatewayMessage {
        loop {
            let frame = self.recv().await;
            if frame.op != OpCode::Heartbeat {
                return frame;
            }
        }
    }

    /// Hello, Identify, READY
    pub async fn accept(&mut self, user: UserId) -> String {
        self.send(GatewayMessage::hello(HelloPayload::with_interval(60_000)));
        let identify = self.recv_op().await;
        assert_eq!(identify.op, OpCode::Identify);
        let token = identify.data::<IdentifyPayload>().expect("identify payload").token;
        let ready = serde_json::to_value(ReadyEvent::new(user, "session-1", 60_000)).unwrap();
        self.send(GatewayMessage::dispatch("READY", 1, ready));
        token
    }
}
