use thiserror::Error;

/// Failures raised while dissecting an inbound frame.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("frame too short: {actual} bytes, at least {min} required")]
    TooShort { actual: usize, min: usize },

    #[error("unexpected frame size: {actual} bytes, expected {expected}")]
    Size { actual: usize, expected: usize },

    #[error("frame format error: {0}")]
    Format(String),

    #[error("CRC error: calculated={calculated:04X}, received={received:04X}, frame={frame_hex}")]
    Crc {
        calculated: u16,
        received: u16,
        frame_hex: String,
    },
}
