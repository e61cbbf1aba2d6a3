use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Validation errors
    #[error("Operation {operation} is not valid for command {command}")]
    InvalidOperation { command: String, operation: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid connection ID: {0}")]
    InvalidConnectionId(u8),

    // Capacity errors
    #[error("Send buffer full: requested {requested} bytes, {available} available")]
    BufferFull { requested: usize, available: usize },

    #[error("Command queue full ({capacity} commands)")]
    QueueFull { capacity: usize },

    #[error("Too many literals to wait for: requested {requested}, pool has {available}")]
    TooManyLiterals { requested: usize, available: usize },

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
