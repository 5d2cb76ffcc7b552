//! CRC-16 used to validate frames.
//!
//! Reflected CCITT variant: polynomial 0x8408, seed 0, processed one byte
//! at a time least-significant bit first.

/// Reflected polynomial
pub const CRC16_POLY: u16 = 0x8408;

/// Compute the CRC-16 of `data`, continuing from `init`
///
/// Pass `0` as `init` to start a new checksum. Feeding a buffer in chunks
/// and chaining the results gives the same value as one call over the
/// whole buffer.
pub fn crc16(init: u16, data: &[u8]) -> u16 {
    let mut crc = init;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ CRC16_POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}
