//! Master-side request builders and reply parsers.
//!
//! Builders write a complete ADU (CRC included) into a caller-provided
//! buffer and return the framed length. Parsers validate size and CRC in
//! that order, then hand back a typed view over the caller's bytes.

use crate::crc::CRC_SIZE;
use crate::errors::{FrameError, RequestError};
use crate::frame::{check_crc, implace_crc, FunctionCode};

/// Request count ceiling for the fixed-shape read functions (fc 1..=4).
const RD_COUNT_MAX: u16 = 0x7D;
/// Register count ceiling for WriteRegisters.
const WR_REGISTERS_MAX: u16 = 0x7B;
/// Byte count ceiling for the user-range byte operations: 256 minus
/// address, function code, memory address, count and CRC.
const BYTES_MAX: u16 = 249;

fn write_frame(dst: &mut [u8], body: &[u8]) -> Result<usize, RequestError> {
    if body.len() + CRC_SIZE > dst.len() {
        return Err(RequestError::BufferTooSmall {
            needed: body.len() + CRC_SIZE,
            capacity: dst.len(),
        });
    }

    dst[..body.len()].copy_from_slice(body);
    implace_crc(dst, body.len())
}

fn build_rd_fixed(
    fcode: FunctionCode,
    slave_addr: u8,
    mem_addr: u16,
    count: u16,
    dst: &mut [u8],
) -> Result<usize, RequestError> {
    if count == 0 || count > RD_COUNT_MAX {
        return Err(RequestError::CountOutOfRange {
            fcode: fcode.as_u8(),
            count,
            max: RD_COUNT_MAX,
        });
    }

    let [mem_hi, mem_lo] = mem_addr.to_be_bytes();
    let [count_hi, count_lo] = count.to_be_bytes();
    let body = [slave_addr, fcode.as_u8(), mem_hi, mem_lo, count_hi, count_lo];
    write_frame(dst, &body)
}

/// Builds a ReadCoils (fc 1) request.
pub fn build_rd_coils(
    slave_addr: u8,
    mem_addr: u16,
    count: u16,
    dst: &mut [u8],
) -> Result<usize, RequestError> {
    build_rd_fixed(FunctionCode::ReadCoils, slave_addr, mem_addr, count, dst)
}

/// Builds a ReadInputs (fc 2) request.
pub fn build_rd_inputs(
    slave_addr: u8,
    mem_addr: u16,
    count: u16,
    dst: &mut [u8],
) -> Result<usize, RequestError> {
    build_rd_fixed(FunctionCode::ReadInputs, slave_addr, mem_addr, count, dst)
}

/// Builds a ReadHoldingRegisters (fc 3) request.
pub fn build_rd_holding_registers(
    slave_addr: u8,
    mem_addr: u16,
    count: u16,
    dst: &mut [u8],
) -> Result<usize, RequestError> {
    build_rd_fixed(
        FunctionCode::ReadHoldingRegisters,
        slave_addr,
        mem_addr,
        count,
        dst,
    )
}

/// Builds a ReadInputRegisters (fc 4) request.
pub fn build_rd_input_registers(
    slave_addr: u8,
    mem_addr: u16,
    count: u16,
    dst: &mut [u8],
) -> Result<usize, RequestError> {
    build_rd_fixed(
        FunctionCode::ReadInputRegisters,
        slave_addr,
        mem_addr,
        count,
        dst,
    )
}

/// Builds a WriteCoil (fc 5) request. `value` must be 0x0000 (off) or
/// 0xFF00 (on); anything else is rejected before it reaches the wire.
pub fn build_wr_coil(
    slave_addr: u8,
    mem_addr: u16,
    value: u16,
    dst: &mut [u8],
) -> Result<usize, RequestError> {
    if value != 0x0000 && value != 0xFF00 {
        return Err(RequestError::InvalidCoilValue { value });
    }

    let [mem_hi, mem_lo] = mem_addr.to_be_bytes();
    let [value_hi, value_lo] = value.to_be_bytes();
    let body = [
        slave_addr,
        FunctionCode::WriteCoil.as_u8(),
        mem_hi,
        mem_lo,
        value_hi,
        value_lo,
    ];
    write_frame(dst, &body)
}

/// Builds a WriteRegister (fc 6) request.
pub fn build_wr_register(
    slave_addr: u8,
    mem_addr: u16,
    value: u16,
    dst: &mut [u8],
) -> Result<usize, RequestError> {
    let [mem_hi, mem_lo] = mem_addr.to_be_bytes();
    let [value_hi, value_lo] = value.to_be_bytes();
    let body = [
        slave_addr,
        FunctionCode::WriteRegister.as_u8(),
        mem_hi,
        mem_lo,
        value_hi,
        value_lo,
    ];
    write_frame(dst, &body)
}

/// Builds a WriteRegisters (fc 16) request from a slice of register
/// values.
pub fn build_wr_registers(
    slave_addr: u8,
    mem_addr: u16,
    data: &[u16],
    dst: &mut [u8],
) -> Result<usize, RequestError> {
    let count = data.len() as u16;
    if count == 0 || count > WR_REGISTERS_MAX {
        return Err(RequestError::CountOutOfRange {
            fcode: FunctionCode::WriteRegisters.as_u8(),
            count,
            max: WR_REGISTERS_MAX,
        });
    }

    let body_len = 7 + data.len() * 2;
    if body_len + CRC_SIZE > dst.len() {
        return Err(RequestError::BufferTooSmall {
            needed: body_len + CRC_SIZE,
            capacity: dst.len(),
        });
    }

    let [mem_hi, mem_lo] = mem_addr.to_be_bytes();
    let [count_hi, count_lo] = count.to_be_bytes();
    dst[..7].copy_from_slice(&[
        slave_addr,
        FunctionCode::WriteRegisters.as_u8(),
        mem_hi,
        mem_lo,
        count_hi,
        count_lo,
        (count << 1) as u8,
    ]);

    let mut cursor = 7;
    for &word in data {
        dst[cursor..cursor + 2].copy_from_slice(&word.to_be_bytes());
        cursor += 2;
    }

    implace_crc(dst, cursor)
}

/// Builds a ReadBytes (fc 65) request for the byte-addressable
/// user range.
pub fn build_rd_bytes(
    slave_addr: u8,
    mem_addr: u16,
    count: u8,
    dst: &mut [u8],
) -> Result<usize, RequestError> {
    if count == 0 || u16::from(count) > BYTES_MAX {
        return Err(RequestError::CountOutOfRange {
            fcode: FunctionCode::ReadBytes.as_u8(),
            count: u16::from(count),
            max: BYTES_MAX,
        });
    }

    let [mem_hi, mem_lo] = mem_addr.to_be_bytes();
    let body = [
        slave_addr,
        FunctionCode::ReadBytes.as_u8(),
        mem_hi,
        mem_lo,
        count,
    ];
    write_frame(dst, &body)
}

/// Builds a WriteBytes (fc 66) request carrying `data` verbatim.
pub fn build_wr_bytes(
    slave_addr: u8,
    mem_addr: u16,
    data: &[u8],
    dst: &mut [u8],
) -> Result<usize, RequestError> {
    let count = data.len() as u16;
    if count == 0 || count > BYTES_MAX {
        return Err(RequestError::CountOutOfRange {
            fcode: FunctionCode::WriteBytes.as_u8(),
            count,
            max: BYTES_MAX,
        });
    }

    let body_len = 5 + data.len();
    if body_len + CRC_SIZE > dst.len() {
        return Err(RequestError::BufferTooSmall {
            needed: body_len + CRC_SIZE,
            capacity: dst.len(),
        });
    }

    let [mem_hi, mem_lo] = mem_addr.to_be_bytes();
    dst[..5].copy_from_slice(&[
        slave_addr,
        FunctionCode::WriteBytes.as_u8(),
        mem_hi,
        mem_lo,
        count as u8,
    ]);
    dst[5..body_len].copy_from_slice(data);

    implace_crc(dst, body_len)
}

/// Reply to a register read (fc 3/4): a run of big-endian data words.
#[derive(Debug)]
pub struct RegistersReply<'a> {
    pub slave_addr: u8,
    pub fcode: u8,
    pub byte_count: u8,
    data: &'a [u8],
}

impl<'a> RegistersReply<'a> {
    pub fn register_count(&self) -> usize {
        self.data.len() / 2
    }

    pub fn register(&self, index: usize) -> Option<u16> {
        let offset = index.checked_mul(2)?;
        let pair = self.data.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([pair[0], pair[1]]))
    }

    pub fn registers(&self) -> impl Iterator<Item = u16> + 'a {
        self.data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
    }
}

/// Reply to a ReadBytes request: the raw byte run.
#[derive(Debug)]
pub struct RdBytesReply<'a> {
    pub slave_addr: u8,
    pub mem_addr: u16,
    pub bytes: &'a [u8],
}

/// Reply to a WriteBytes request: the echoed header, no data.
#[derive(Debug, PartialEq, Eq)]
pub struct WrBytesReply {
    pub slave_addr: u8,
    pub mem_addr: u16,
    pub count: u8,
}

/// Echo reply to WriteCoil / WriteRegister.
#[derive(Debug, PartialEq, Eq)]
pub struct WrEchoReply {
    pub slave_addr: u8,
    pub fcode: u8,
    pub mem_addr: u16,
    pub value: u16,
}

/// Echo reply to WriteRegisters: start address and register count.
#[derive(Debug, PartialEq, Eq)]
pub struct WrRegistersReply {
    pub slave_addr: u8,
    pub mem_addr: u16,
    pub count: u16,
}

fn expect_size(frame: &[u8], expected: usize) -> Result<(), FrameError> {
    if frame.len() != expected {
        return Err(FrameError::Size {
            actual: frame.len(),
            expected,
        });
    }
    Ok(())
}

/// Parses a register-read reply (fc 3/4). The reply's `byte_count` must
/// equal twice the register count and agree with the frame size.
pub fn parse_rd_registers_reply(frame: &[u8]) -> Result<RegistersReply<'_>, FrameError> {
    const HEADER: usize = 3; // slave address, function code, byte count

    if frame.len() < HEADER + CRC_SIZE {
        return Err(FrameError::TooShort {
            actual: frame.len(),
            min: HEADER + CRC_SIZE,
        });
    }

    let byte_count = frame[2];
    expect_size(frame, HEADER + usize::from(byte_count) + CRC_SIZE)?;
    if byte_count % 2 != 0 {
        return Err(FrameError::Format(format!(
            "odd byte count {byte_count} in register read reply"
        )));
    }
    check_crc(frame)?;

    Ok(RegistersReply {
        slave_addr: frame[0],
        fcode: frame[1],
        byte_count,
        data: &frame[HEADER..HEADER + usize::from(byte_count)],
    })
}

/// Parses a ReadBytes reply. The expected ADU size is derived from the
/// echoed count: header(5) + count + crc(2).
pub fn parse_rd_bytes_reply(frame: &[u8]) -> Result<RdBytesReply<'_>, FrameError> {
    const HEADER: usize = 5; // slave address, function code, memory address, count

    if frame.len() < HEADER + CRC_SIZE {
        return Err(FrameError::TooShort {
            actual: frame.len(),
            min: HEADER + CRC_SIZE,
        });
    }

    let count = usize::from(frame[4]);
    expect_size(frame, HEADER + count + CRC_SIZE)?;
    check_crc(frame)?;

    Ok(RdBytesReply {
        slave_addr: frame[0],
        mem_addr: u16::from_be_bytes([frame[2], frame[3]]),
        bytes: &frame[HEADER..HEADER + count],
    })
}

/// Parses a WriteBytes reply (fixed 7-byte echo).
pub fn parse_wr_bytes_reply(frame: &[u8]) -> Result<WrBytesReply, FrameError> {
    expect_size(frame, 7)?;
    check_crc(frame)?;

    Ok(WrBytesReply {
        slave_addr: frame[0],
        mem_addr: u16::from_be_bytes([frame[2], frame[3]]),
        count: frame[4],
    })
}

/// Parses the echo reply of WriteCoil / WriteRegister (fixed 8 bytes).
pub fn parse_wr_echo_reply(frame: &[u8]) -> Result<WrEchoReply, FrameError> {
    expect_size(frame, 8)?;
    check_crc(frame)?;

    Ok(WrEchoReply {
        slave_addr: frame[0],
        fcode: frame[1],
        mem_addr: u16::from_be_bytes([frame[2], frame[3]]),
        value: u16::from_be_bytes([frame[4], frame[5]]),
    })
}

/// Parses the echo reply of WriteRegisters (fixed 8 bytes).
pub fn parse_wr_registers_reply(frame: &[u8]) -> Result<WrRegistersReply, FrameError> {
    expect_size(frame, 8)?;
    check_crc(frame)?;

    Ok(WrRegistersReply {
        slave_addr: frame[0],
        mem_addr: u16::from_be_bytes([frame[2], frame[3]]),
        count: u16::from_be_bytes([frame[4], frame[5]]),
    })
}

/// Detects an exception reply: exactly five bytes with a valid CRC.
/// Returns the exception code byte.
pub fn find_ecode(frame: &[u8]) -> Option<u8> {
    if frame.len() != 5 {
        return None;
    }
    check_crc(frame).ok()?;
    Some(frame[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ExceptionCode;

    #[test]
    fn rd_holding_registers_request_layout() {
        let mut buf = [0u8; 16];
        let len = build_rd_holding_registers(0x01, 0x0000, 10, &mut buf).unwrap();

        assert_eq!(
            &buf[..len],
            &[0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD]
        );
    }

    #[test]
    fn rd_count_limits() {
        let mut buf = [0u8; 16];
        assert!(matches!(
            build_rd_coils(0x01, 0, 0, &mut buf),
            Err(RequestError::CountOutOfRange { .. })
        ));
        assert!(matches!(
            build_rd_holding_registers(0x01, 0, 0x7E, &mut buf),
            Err(RequestError::CountOutOfRange { .. })
        ));
        assert!(build_rd_inputs(0x01, 0, 0x7D, &mut buf).is_ok());
        assert!(build_rd_input_registers(0x01, 0, 1, &mut buf).is_ok());
    }

    #[test]
    fn wr_coil_rejects_illegal_values() {
        let mut buf = [0u8; 16];
        assert!(matches!(
            build_wr_coil(0x01, 0x0010, 0x1234, &mut buf),
            Err(RequestError::InvalidCoilValue { value: 0x1234 })
        ));

        let len = build_wr_coil(0x01, 0x0010, 0xFF00, &mut buf).unwrap();
        assert_eq!(&buf[..6], &[0x01, 0x05, 0x00, 0x10, 0xFF, 0x00]);
        assert_eq!(len, 8);
    }

    #[test]
    fn wr_registers_request_layout() {
        let mut buf = [0u8; 32];
        let len = build_wr_registers(0x01, 0x0001, &[0x000A, 0x0102], &mut buf).unwrap();

        assert_eq!(
            &buf[..len],
            &[0x01, 0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02, 0x92, 0x30]
        );
    }

    #[test]
    fn wr_registers_count_limit() {
        let mut buf = [0u8; 256];
        let data = [0u16; 0x7C];
        assert!(matches!(
            build_wr_registers(0x01, 0, &data, &mut buf),
            Err(RequestError::CountOutOfRange { .. })
        ));
        assert!(build_wr_registers(0x01, 0, &data[..0x7B], &mut buf).is_ok());
    }

    #[test]
    fn byte_requests_respect_limits() {
        let mut buf = [0u8; 256];
        assert!(matches!(
            build_rd_bytes(0x01, 0, 250, &mut buf),
            Err(RequestError::CountOutOfRange { .. })
        ));
        assert!(build_rd_bytes(0x01, 0, 249, &mut buf).is_ok());

        let data = [0u8; 250];
        assert!(matches!(
            build_wr_bytes(0x01, 0, &data, &mut buf),
            Err(RequestError::CountOutOfRange { .. })
        ));
        assert!(build_wr_bytes(0x01, 0, &data[..249], &mut buf).is_ok());
    }

    #[test]
    fn buffer_too_small_is_reported() {
        let mut buf = [0u8; 7];
        assert!(matches!(
            build_rd_bytes(0x01, 0, 1, &mut buf),
            Ok(7)
        ));

        let mut buf = [0u8; 6];
        assert!(matches!(
            build_rd_bytes(0x01, 0, 1, &mut buf),
            Err(RequestError::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn rd_registers_reply_round_trip() {
        // Two registers: 0x0005, 0x00AB
        let mut frame = [0u8; 16];
        frame[..7].copy_from_slice(&[0x11, 0x03, 0x04, 0x00, 0x05, 0x00, 0xAB]);
        let len = implace_crc(&mut frame, 7).unwrap();

        let reply = parse_rd_registers_reply(&frame[..len]).unwrap();
        assert_eq!(reply.slave_addr, 0x11);
        assert_eq!(reply.byte_count, 4);
        assert_eq!(reply.register_count(), 2);
        assert_eq!(reply.register(0), Some(0x0005));
        assert_eq!(reply.register(1), Some(0x00AB));
        assert_eq!(reply.register(2), None);
        assert_eq!(reply.registers().collect::<Vec<_>>(), vec![0x0005, 0x00AB]);
    }

    #[test]
    fn rd_registers_reply_size_must_match_byte_count() {
        let mut frame = [0u8; 16];
        frame[..7].copy_from_slice(&[0x11, 0x03, 0x06, 0x00, 0x05, 0x00, 0xAB]);
        let len = implace_crc(&mut frame, 7).unwrap();

        assert!(matches!(
            parse_rd_registers_reply(&frame[..len]),
            Err(FrameError::Size { .. })
        ));
    }

    #[test]
    fn rd_bytes_reply_round_trip() {
        let mut frame = [0u8; 16];
        frame[..8].copy_from_slice(&[0xAA, 0x41, 0x10, 0x00, 0x03, 0x61, 0x62, 0x63]);
        let len = implace_crc(&mut frame, 8).unwrap();

        let reply = parse_rd_bytes_reply(&frame[..len]).unwrap();
        assert_eq!(reply.slave_addr, 0xAA);
        assert_eq!(reply.mem_addr, 0x1000);
        assert_eq!(reply.bytes, b"abc");
    }

    #[test]
    fn wr_bytes_reply_round_trip() {
        let mut frame = [0u8; 16];
        frame[..5].copy_from_slice(&[0xAA, 0x42, 0x10, 0x00, 0x1F]);
        let len = implace_crc(&mut frame, 5).unwrap();

        let reply = parse_wr_bytes_reply(&frame[..len]).unwrap();
        assert_eq!(
            reply,
            WrBytesReply {
                slave_addr: 0xAA,
                mem_addr: 0x1000,
                count: 0x1F
            }
        );
    }

    #[test]
    fn wr_echo_reply_round_trip() {
        let mut frame = [0u8; 16];
        let len = build_wr_register(0xAA, 0x1020, 0x00AB, &mut frame).unwrap();

        // The slave echoes the request verbatim
        let reply = parse_wr_echo_reply(&frame[..len]).unwrap();
        assert_eq!(
            reply,
            WrEchoReply {
                slave_addr: 0xAA,
                fcode: 0x06,
                mem_addr: 0x1020,
                value: 0x00AB
            }
        );
    }

    #[test]
    fn wr_registers_reply_round_trip() {
        let mut frame = [0u8; 16];
        frame[..6].copy_from_slice(&[0x01, 0x10, 0x00, 0x01, 0x00, 0x02]);
        let len = implace_crc(&mut frame, 6).unwrap();

        let reply = parse_wr_registers_reply(&frame[..len]).unwrap();
        assert_eq!(
            reply,
            WrRegistersReply {
                slave_addr: 0x01,
                mem_addr: 0x0001,
                count: 2
            }
        );
    }

    #[test]
    fn find_ecode_detects_exception_replies() {
        let mut frame = [0u8; 8];
        frame[..3].copy_from_slice(&[0xAA, 0xD9, 0x01]);
        let len = implace_crc(&mut frame, 3).unwrap();

        assert_eq!(
            find_ecode(&frame[..len]),
            Some(ExceptionCode::IllegalFunction.as_u8())
        );
    }

    #[test]
    fn find_ecode_ignores_other_frames() {
        let mut frame = [0u8; 16];
        let len = build_wr_register(0xAA, 0x1020, 0x00AB, &mut frame).unwrap();
        assert_eq!(find_ecode(&frame[..len]), None);

        // Right size, broken CRC
        assert_eq!(find_ecode(&[0xAA, 0xD9, 0x01, 0x00, 0x00]), None);
    }

    #[test]
    fn corrupted_reply_is_rejected() {
        let mut frame = [0u8; 16];
        frame[..5].copy_from_slice(&[0xAA, 0x42, 0x10, 0x00, 0x1F]);
        let len = implace_crc(&mut frame, 5).unwrap();
        frame[len - 1] ^= 0xFF;

        assert!(matches!(
            parse_wr_bytes_reply(&frame[..len]),
            Err(FrameError::Crc { .. })
        ));
    }
}
