//! On-wire frame layout.
//!
//! An ADU is `address(1) | function_code(1) | data(0..252) | crc(2)`, at
//! most 256 bytes. The PDU is the middle `function_code | data` portion.
//! Memory addresses and register data travel high byte first; the CRC
//! trailer travels low byte first.

use crate::crc::{calc_crc16, encode_crc, CRC_SIZE};
use crate::errors::{FrameError, RequestError};

/// Maximum ADU size on the serial line.
pub const ADU_CAPACITY: usize = 256;
/// Smallest well-formed ADU: address, function code and the CRC trailer.
pub const ADU_MIN_SIZE: usize = 1 + 1 + CRC_SIZE;
/// Maximum PDU size (function code plus data).
pub const PDU_CAPACITY: usize = 253;
/// Maximum data portion of a PDU.
pub const PDU_DATA_CAPACITY: usize = 252;

/// Frames addressed to station 0 are processed by every slave and
/// acknowledged by none.
pub const BROADCAST_ADDR: u8 = 0;

/// High bit of the function code marks an exception reply.
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Public, diagnostic and user-range function codes.
///
/// The user-range byte operations (`ReadBytes`/`WriteBytes`) mirror the
/// standard register access functions but address 8-bit cells directly,
/// for devices with a byte-addressable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FunctionCode {
    ReadCoils = 1,
    ReadInputs = 2,
    ReadHoldingRegisters = 3,
    ReadInputRegisters = 4,
    WriteCoil = 5,
    WriteRegister = 6,
    ReadExceptionStatus = 7,
    Diagnostic = 8,
    GetComEventCounter = 11,
    GetComEventLog = 12,
    WriteCoils = 15,
    WriteRegisters = 16,
    ReportServerId = 17,
    ReadFile = 20,
    WriteFile = 21,
    MaskWriteRegister = 22,
    ReadWriteRegisters = 23,
    ReadFifo = 24,
    ReadDeviceId = 43,
    ReadBytes = 65,
    WriteBytes = 66,
}

impl FunctionCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::ReadCoils),
            2 => Some(Self::ReadInputs),
            3 => Some(Self::ReadHoldingRegisters),
            4 => Some(Self::ReadInputRegisters),
            5 => Some(Self::WriteCoil),
            6 => Some(Self::WriteRegister),
            7 => Some(Self::ReadExceptionStatus),
            8 => Some(Self::Diagnostic),
            11 => Some(Self::GetComEventCounter),
            12 => Some(Self::GetComEventLog),
            15 => Some(Self::WriteCoils),
            16 => Some(Self::WriteRegisters),
            17 => Some(Self::ReportServerId),
            20 => Some(Self::ReadFile),
            21 => Some(Self::WriteFile),
            22 => Some(Self::MaskWriteRegister),
            23 => Some(Self::ReadWriteRegisters),
            24 => Some(Self::ReadFifo),
            43 => Some(Self::ReadDeviceId),
            65 => Some(Self::ReadBytes),
            66 => Some(Self::WriteBytes),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Exception codes carried in the single data byte of an exception reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExceptionCode {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
    ServerDeviceFailure = 0x04,
    /// User-range code for requests whose shape does not match their
    /// function code.
    FormatError = 0x80,
}

impl ExceptionCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::IllegalFunction),
            0x02 => Some(Self::IllegalDataAddress),
            0x03 => Some(Self::IllegalDataValue),
            0x04 => Some(Self::ServerDeviceFailure),
            0x80 => Some(Self::FormatError),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Computes the CRC over `dst[..payload_len]` and writes it, low byte
/// first, into the two bytes that follow. Returns the framed length.
pub fn implace_crc(dst: &mut [u8], payload_len: usize) -> Result<usize, RequestError> {
    let framed = payload_len + CRC_SIZE;
    if framed > dst.len() {
        return Err(RequestError::BufferTooSmall {
            needed: framed,
            capacity: dst.len(),
        });
    }

    let crc = calc_crc16(&dst[..payload_len]);
    dst[payload_len..framed].copy_from_slice(&encode_crc(crc));
    Ok(framed)
}

/// Verifies the CRC trailer of a complete frame.
pub fn check_crc(frame: &[u8]) -> Result<(), FrameError> {
    if frame.len() <= CRC_SIZE {
        return Err(FrameError::TooShort {
            actual: frame.len(),
            min: ADU_MIN_SIZE,
        });
    }

    let payload = &frame[..frame.len() - CRC_SIZE];
    let calculated = calc_crc16(payload);
    let received = u16::from_le_bytes([frame[frame.len() - 2], frame[frame.len() - 1]]);

    if calculated != received {
        return Err(FrameError::Crc {
            calculated,
            received,
            frame_hex: hex::encode(payload),
        });
    }

    Ok(())
}
