//! Connection status reported to the application

use std::fmt;

/// Where the client is in its connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// First connection attempt in progress
    #[default]
    Connecting,
    /// Identified and delivering
    Connected,
    /// Waiting to retry after a drop
    Reconnecting { attempt: u32 },
    /// Retries exhausted or credentials refused; waits for a manual reconnect
    Failed,
    /// Shut down by the application
    Closed,
}

impl ConnectionStatus {
    #[must_use]
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::Connected => f.write_str("connected"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
            Self::Failed => f.write_str("failed"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Snapshot published on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientStatus {
    pub connection: ConnectionStatus,
    /// Sends the gateway has not yet acked or rejected
    pub queued: usize,
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} queued", self.connection, self.queued)
    }
}
