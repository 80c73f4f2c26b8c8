use thiserror::Error;

/// Failures raised while building an outbound request.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("destination buffer too small: {needed} bytes needed, {capacity} available")]
    BufferTooSmall { needed: usize, capacity: usize },

    #[error("count {count} out of range for function {fcode:#04X}, limit {max}")]
    CountOutOfRange { fcode: u8, count: u16, max: u16 },

    #[error("illegal coil value {value:#06X}: only 0x0000 and 0xFF00 are permitted")]
    InvalidCoilValue { value: u16 },
}
