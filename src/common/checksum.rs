// src/common/checksum.rs

use super::error::PmsError;

/// Calculates the PMS frame checksum: the plain sum of every byte, modulo 2^16.
///
/// The sum covers everything from the `0x42 0x4D` signature up to the byte
/// *before* the checksum field itself.
#[inline]
pub fn sum16(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)))
}

/// Encodes a checksum into the two big-endian bytes that go on the wire.
#[inline]
pub fn encode_checksum(checksum: u16) -> [u8; 2] {
    checksum.to_be_bytes()
}

/// Decodes a big-endian checksum from the last two bytes of a frame.
///
/// # Panics
///
/// Panics if `bytes` does not have a length of exactly 2.
pub fn decode_checksum(bytes: &[u8]) -> u16 {
    assert_eq!(bytes.len(), 2, "checksum must be 2 bytes long");
    u16::from_be_bytes([bytes[0], bytes[1]])
}

/// Verifies a complete frame whose final two bytes carry its checksum.
///
/// # Returns
///
/// * `Ok(())` if the checksum matches.
/// * `Err(PmsError::ShortRead)` if the buffer cannot even hold a checksum.
/// * `Err(PmsError::ChecksumMismatch)` if the sums differ.
pub fn verify_frame_checksum<E>(frame: &[u8]) -> Result<(), PmsError<E>>
where
    E: core::fmt::Debug,
{
    if frame.len() < 2 {
        return Err(PmsError::ShortRead { expected: 2, got: frame.len() });
    }
    let data_len = frame.len() - 2;
    let calculated = sum16(&frame[..data_len]);
    let expected = decode_checksum(&frame[data_len..]);

    if calculated == expected {
        Ok(())
    } else {
        Err(PmsError::ChecksumMismatch { expected, calculated })
    }
}
