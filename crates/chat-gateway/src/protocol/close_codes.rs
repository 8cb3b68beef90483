//! Application close codes (4000-4999 range)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    UnknownError = 4000,
    UnknownOpcode = 4001,
    /// Frame was not valid JSON or had the wrong shape for its opcode
    DecodeError = 4002,
    /// Room or message op before IDENTIFY
    NotAuthenticated = 4003,
    /// Missing, invalid or expired token
    AuthenticationFailed = 4004,
    /// IDENTIFY sent twice
    AlreadyAuthenticated = 4005,
    /// No IDENTIFY within the auth timeout, or heartbeats stopped
    SessionTimeout = 4009,
}

const ALL: [CloseCode; 7] = [
    CloseCode::UnknownError,
    CloseCode::UnknownOpcode,
    CloseCode::DecodeError,
    CloseCode::NotAuthenticated,
    CloseCode::AuthenticationFailed,
    CloseCode::AlreadyAuthenticated,
    CloseCode::SessionTimeout,
];

impl CloseCode {
    /// `None` for standard codes and unassigned application codes
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        ALL.into_iter().find(|code| code.as_u16() == value)
    }

    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Credential problems are final; reconnecting with the same token fails again
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        !matches!(self, Self::NotAuthenticated | Self::AuthenticationFailed)
    }

    /// Close-frame reason text
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::UnknownError => "unknown error",
            Self::UnknownOpcode => "unknown opcode",
            Self::DecodeError => "malformed frame",
            Self::NotAuthenticated => "identify first",
            Self::AuthenticationFailed => "authentication failed",
            Self::AlreadyAuthenticated => "already identified",
            Self::SessionTimeout => "session timed out",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.description())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
