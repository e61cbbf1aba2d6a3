use crate::{Result, constants::MAX_CONNECTIONS, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection identifier assigned by the radio (single digit, 0-4).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct ConnectionId(u8);

impl ConnectionId {
    /// Create a new connection ID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidConnectionId` if the ID is not below [`MAX_CONNECTIONS`].
    pub fn new(id: u8) -> Result<Self> {
        if usize::from(id) >= MAX_CONNECTIONS {
            return Err(Error::InvalidConnectionId(id));
        }
        Ok(ConnectionId(id))
    }

    /// Parse a connection ID from its ASCII digit.
    ///
    /// Returns `None` for anything outside `'0'..='4'`.
    #[must_use]
    pub fn from_digit(byte: u8) -> Option<Self> {
        if byte.is_ascii_digit() {
            Self::new(byte - b'0').ok()
        } else {
            None
        }
    }

    /// Get the raw connection ID.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Table index of this connection.
    #[must_use]
    pub fn index(&self) -> usize {
        usize::from(self.0)
    }

    /// ASCII digit used on the wire.
    #[must_use]
    pub fn as_digit(&self) -> u8 {
        b'0' + self.0
    }

    /// Iterate over every valid connection ID in ascending order.
    pub fn all() -> impl Iterator<Item = ConnectionId> {
        (0..MAX_CONNECTIONS as u8).map(ConnectionId)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for ConnectionId {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        ConnectionId::new(id)
    }
}

impl From<ConnectionId> for u8 {
    fn from(id: ConnectionId) -> Self {
        id.0
    }
}

/// State of one connection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Closed,
    Open,
}

impl ConnectionStatus {
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionStatus::Open)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectionStatus::Closed => write!(f, "closed"),
            ConnectionStatus::Open => write!(f, "open"),
        }
    }
}

/// Payload of a connection-changed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub connection_id: ConnectionId,
    pub new_status: ConnectionStatus,
}

impl ConnectionInfo {
    #[must_use]
    pub fn new(connection_id: ConnectionId, new_status: ConnectionStatus) -> Self {
        Self {
            connection_id,
            new_status,
        }
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "connection {} {}", self.connection_id, self.new_status)
    }
}
