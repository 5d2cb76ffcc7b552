//! Frame encoding and decoding for the Courier command protocol.
//!
//! Frame format (multi-byte fields little-endian):
//! - MAGIC (2 bytes): 0xAC 0xDA
//! - VERSION (1 byte): protocol version, currently 1
//! - FLAGS (1 byte): bit 0 = FIN (last frame of a message)
//! - STREAM ID (1 byte): 0 when the frame belongs to no stream
//! - LENGTH (2 bytes): payload length
//! - PAYLOAD (LENGTH bytes)
//! - CRC (2 bytes): CRC-16 over header and payload

use crate::crc::crc16;

/// Frame synchronization bytes
pub const MAGIC: [u8; 2] = [0xAC, 0xDA];

/// Protocol version carried in every frame
pub const VERSION: u8 = 0x01;

/// Flag bit marking the final frame of a message
pub const FLAG_FIN: u8 = 0x01;

/// Stream id used when a frame belongs to no stream
pub const STREAM_NONE: u8 = 0x00;

/// Header size (MAGIC + VERSION + FLAGS + SID + LENGTH)
pub const HEADER_SIZE: usize = 7;

/// Trailing checksum size
pub const CRC_SIZE: usize = 2;

/// Bytes added around every payload
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + CRC_SIZE;

/// Largest payload the 16-bit length field can describe
pub const MAX_PAYLOAD_SIZE: usize = 0xFFFF;

pub(crate) const OFF_VERSION: usize = 2;
const OFF_FLAGS: usize = 3;
const OFF_SID: usize = 4;
pub(crate) const OFF_LEN: usize = 5;

/// Errors that can occur during frame encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload does not fit the 16-bit length field
    PayloadTooLarge,
    /// Destination buffer cannot hold the encoded frame
    BufferTooSmall,
    /// Fewer bytes than an empty frame
    Truncated,
    /// Magic bytes do not match
    BadMagic,
    /// Version byte is not supported
    UnsupportedVersion,
    /// Declared payload length disagrees with the input length
    LengthMismatch,
    /// Recomputed CRC differs from the transmitted one
    ChecksumMismatch,
}

/// Per-frame header options chosen by the sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameOptions {
    /// Flag bits (see [`FLAG_FIN`])
    pub flags: u8,
    /// Stream identifier (see [`STREAM_NONE`])
    pub stream_id: u8,
}

impl FrameOptions {
    /// Single, complete frame outside of any stream
    pub const fn single() -> Self {
        Self {
            flags: FLAG_FIN,
            stream_id: STREAM_NONE,
        }
    }
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self::single()
    }
}

/// A validated frame, borrowing its payload from the input bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameView<'a> {
    /// Flag bits from the header
    pub flags: u8,
    /// Stream identifier from the header
    pub stream_id: u8,
    /// Payload bytes (no copy)
    pub payload: &'a [u8],
}

impl FrameView<'_> {
    /// Check whether the FIN flag is set
    pub fn is_final(&self) -> bool {
        self.flags & FLAG_FIN != 0
    }
}

/// Encode `payload` into `buffer` as a complete frame
///
/// Returns the number of bytes written (`payload.len() + FRAME_OVERHEAD`).
pub fn encode_frame(
    payload: &[u8],
    options: FrameOptions,
    buffer: &mut [u8],
) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge);
    }

    let frame_len = payload.len() + FRAME_OVERHEAD;
    if buffer.len() < frame_len {
        return Err(FrameError::BufferTooSmall);
    }

    let length = (payload.len() as u16).to_le_bytes();
    buffer[..2].copy_from_slice(&MAGIC);
    buffer[OFF_VERSION] = VERSION;
    buffer[OFF_FLAGS] = options.flags;
    buffer[OFF_SID] = options.stream_id;
    buffer[OFF_LEN..HEADER_SIZE].copy_from_slice(&length);

    let crc_at = HEADER_SIZE + payload.len();
    buffer[HEADER_SIZE..crc_at].copy_from_slice(payload);

    let crc = crc16(0, &buffer[..crc_at]);
    buffer[crc_at..frame_len].copy_from_slice(&crc.to_le_bytes());

    Ok(frame_len)
}

/// Validate a complete frame and borrow its payload
///
/// Checks run in wire order: minimum length, magic, version, declared
/// length against actual length, then checksum. Nothing is exposed unless
/// every check passes.
pub fn decode_frame(bytes: &[u8]) -> Result<FrameView<'_>, FrameError> {
    if bytes.len() < FRAME_OVERHEAD {
        return Err(FrameError::Truncated);
    }

    if bytes[..2] != MAGIC {
        return Err(FrameError::BadMagic);
    }

    if bytes[OFF_VERSION] != VERSION {
        return Err(FrameError::UnsupportedVersion);
    }

    let payload_len = u16::from_le_bytes([bytes[OFF_LEN], bytes[OFF_LEN + 1]]) as usize;
    if payload_len + FRAME_OVERHEAD != bytes.len() {
        return Err(FrameError::LengthMismatch);
    }

    let crc_at = HEADER_SIZE + payload_len;
    let expected = crc16(0, &bytes[..crc_at]);
    let received = u16::from_le_bytes([bytes[crc_at], bytes[crc_at + 1]]);
    if expected != received {
        return Err(FrameError::ChecksumMismatch);
    }

    Ok(FrameView {
        flags: bytes[OFF_FLAGS],
        stream_id: bytes[OFF_SID],
        payload: &bytes[HEADER_SIZE..crc_at],
    })
}
