use thiserror::Error;

/// Argument errors raised while handling a command. The `Display` text is the
/// `message` field of the error response sent back to the peer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Invalid arguments")]
    InvalidArguments,
    #[error("Invalid format")]
    InvalidFormat,
    #[error("Invalid number: '{0}'")]
    InvalidNumber(String),
    #[error("Invalid timestamp")]
    InvalidTimestamp,
    #[error("Invalid rate")]
    InvalidRate,
    #[error("Invalid level")]
    InvalidLevel,
    #[error("Unknown printer: '{0}'")]
    UnknownPrinter(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("invalid argument: target time must be > 0, got {0}")]
    InvalidArgument(i64),
}

impl From<ClockError> for CommandError {
    fn from(_: ClockError) -> Self {
        CommandError::InvalidTimestamp
    }
}

#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
