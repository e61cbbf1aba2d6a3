//! Error types for transport and timer operations.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors raised by the serial link and its helpers.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Port is not connected or has been closed.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Operation timed out after specified duration.
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Read or write failure on the link.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Port could not be opened.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// Invalid port settings.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }
}

impl From<serialport::Error> for HardwareError {
    fn from(err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => Self::disconnected(err.description),
            serialport::ErrorKind::InvalidInput => Self::configuration(err.description),
            serialport::ErrorKind::Io(_) | serialport::ErrorKind::Unknown => {
                Self::communication(err.description)
            }
        }
    }
}

impl From<HardwareError> for atlink_core::Error {
    fn from(err: HardwareError) -> Self {
        atlink_core::Error::Transport(err.to_string())
    }
}
