use thiserror::Error;

use super::{ConfigValidationError, FrameError, RequestError, TransportError};

/// Top-level error for the stack's fallible entry points.
#[derive(Error, Debug)]
pub enum StackError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigValidationError),

    #[error("Initialization error: {0}")]
    Init(String),
}

impl From<serialport::Error> for StackError {
    fn from(err: serialport::Error) -> Self {
        Self::Transport(TransportError::Serial(err))
    }
}

impl From<std::io::Error> for StackError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(TransportError::Io(err))
    }
}
