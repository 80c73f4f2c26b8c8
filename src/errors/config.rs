use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigValidationError {
    #[error("unsupported baud rate {0}")]
    UnsupportedBaudRate(u32),

    #[error("invalid station address {0}: must be in 1..=247")]
    InvalidAddress(u8),

    #[error("RTU mode requires 8 data bits, got {0}")]
    InvalidDataBits(u8),

    #[error("device path missing")]
    MissingDevice,

    #[error("invalid memory window: begin={begin:#06X}, size={size}")]
    InvalidMemoryWindow { begin: u16, size: u16 },

    #[error("invalid timing override: {0}")]
    InvalidTiming(String),

    #[error("invalid parity {0:?}: use E, O or N")]
    InvalidParity(String),

    #[error("invalid log level {0:?}")]
    InvalidLogLevel(String),
}
