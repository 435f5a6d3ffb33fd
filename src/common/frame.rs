// src/common/frame.rs

use super::checksum::{encode_checksum, sum16, verify_frame_checksum};
use super::error::PmsError;

/// Two-byte signature that starts every frame in both directions.
pub const SIGNATURE: [u8; 2] = [0x42, 0x4D];
/// Signature plus the 16-bit length field.
pub const HEADER_LEN: usize = 4;
/// Declared length of a measurement frame (fields, reserved word, checksum).
pub const DATA_FRAME_LENGTH: u16 = 28;
/// Declared length of a reply to a host command.
pub const COMMAND_REPLY_LENGTH: u16 = 4;
/// Complete measurement frame size on the wire.
pub const DATA_FRAME_TOTAL: usize = HEADER_LEN + DATA_FRAME_LENGTH as usize;
/// Complete command reply size on the wire.
pub const COMMAND_REPLY_TOTAL: usize = HEADER_LEN + COMMAND_REPLY_LENGTH as usize;
/// Number of 16-bit measurement fields in a data frame.
pub const FIELD_COUNT: usize = 12;

/// A frame received from the sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(DataFrame),
    CommandReply(CommandReply),
}

/// Decoded measurement frame. Immutable once decoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DataFrame {
    fields: [u16; FIELD_COUNT],
    reserved: u16,
    checksum: u16,
}

impl DataFrame {
    /// Builds a frame from measurement values, computing its checksum.
    pub fn new(fields: [u16; FIELD_COUNT], reserved: u16) -> Self {
        let mut frame = DataFrame { fields, reserved, checksum: 0 };
        let bytes = frame.to_bytes();
        frame.checksum = sum16(&bytes[..DATA_FRAME_TOTAL - 2]);
        frame
    }

    /// Decodes and validates a complete frame, header included.
    ///
    /// The length field must equal [`DATA_FRAME_LENGTH`] and the trailing
    /// checksum must equal the sum of every preceding byte.
    pub fn decode<E>(frame: &[u8]) -> Result<Self, PmsError<E>>
    where
        E: core::fmt::Debug,
    {
        if frame.len() < HEADER_LEN {
            return Err(PmsError::ShortRead { expected: DATA_FRAME_TOTAL, got: frame.len() });
        }
        let declared = u16::from_be_bytes([frame[2], frame[3]]);
        if declared != DATA_FRAME_LENGTH {
            return Err(PmsError::UnexpectedLength(declared));
        }
        if frame.len() < DATA_FRAME_TOTAL {
            return Err(PmsError::ShortRead { expected: DATA_FRAME_TOTAL, got: frame.len() });
        }
        let frame = &frame[..DATA_FRAME_TOTAL];
        verify_frame_checksum(frame)?;

        let mut fields = [0u16; FIELD_COUNT];
        for (i, chunk) in frame[HEADER_LEN..HEADER_LEN + FIELD_COUNT * 2]
            .chunks_exact(2)
            .enumerate()
        {
            fields[i] = u16::from_be_bytes([chunk[0], chunk[1]]);
        }
        let reserved_at = HEADER_LEN + FIELD_COUNT * 2;
        let reserved = u16::from_be_bytes([frame[reserved_at], frame[reserved_at + 1]]);
        let checksum = u16::from_be_bytes([frame[DATA_FRAME_TOTAL - 2], frame[DATA_FRAME_TOTAL - 1]]);

        Ok(DataFrame { fields, reserved, checksum })
    }

    /// Serializes the frame exactly as the sensor transmits it.
    pub fn to_bytes(&self) -> [u8; DATA_FRAME_TOTAL] {
        let mut out = [0u8; DATA_FRAME_TOTAL];
        out[..2].copy_from_slice(&SIGNATURE);
        out[2..4].copy_from_slice(&DATA_FRAME_LENGTH.to_be_bytes());
        for (i, value) in self.fields.iter().enumerate() {
            let at = HEADER_LEN + i * 2;
            out[at..at + 2].copy_from_slice(&value.to_be_bytes());
        }
        let reserved_at = HEADER_LEN + FIELD_COUNT * 2;
        out[reserved_at..reserved_at + 2].copy_from_slice(&self.reserved.to_be_bytes());
        out[DATA_FRAME_TOTAL - 2..].copy_from_slice(&encode_checksum(self.checksum));
        out
    }

    pub fn fields(&self) -> &[u16; FIELD_COUNT] {
        &self.fields
    }

    /// Field `n`, numbered from 1 as in the sensor datasheet (`data1`..`data12`).
    pub fn data(&self, n: usize) -> Option<u16> {
        n.checked_sub(1).and_then(|i| self.fields.get(i).copied())
    }

    pub fn reserved(&self) -> u16 {
        self.reserved
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }
}

/// Reply to a host command. Only the framing is checked; the sensor's
/// reply checksum is carried but never verified.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CommandReply {
    payload: [u8; COMMAND_REPLY_LENGTH as usize],
}

impl CommandReply {
    pub fn new(payload: [u8; COMMAND_REPLY_LENGTH as usize]) -> Self {
        CommandReply { payload }
    }

    /// The command byte being acknowledged.
    pub fn command(&self) -> u8 {
        self.payload[0]
    }

    /// The command's data byte echoed back.
    pub fn data(&self) -> u8 {
        self.payload[1]
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: [u8; 30] = [
        0x42, 0x4D, 0x00, 0x1C, 0x00, 0x0A, 0x00, 0x14, 0x00, 0x1E, 0x00, 0x0A, 0x00, 0x14,
        0x00, 0x1E, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0x05, 0x00, 0x06,
        0x00, 0x00,
    ];

    fn example_frame() -> [u8; DATA_FRAME_TOTAL] {
        let mut frame = [0u8; DATA_FRAME_TOTAL];
        frame[..30].copy_from_slice(&EXAMPLE);
        frame[30..].copy_from_slice(&encode_checksum(sum16(&EXAMPLE)));
        frame
    }

    #[test]
    fn test_decode_example_frame() {
        let frame = DataFrame::decode::<()>(&example_frame()).unwrap();
        assert_eq!(
            frame.fields(),
            &[10, 20, 30, 10, 20, 30, 1, 2, 3, 4, 5, 6]
        );
        assert_eq!(frame.data(1), Some(10));
        assert_eq!(frame.data(2), Some(20));
        assert_eq!(frame.data(3), Some(30));
        assert_eq!(frame.data(12), Some(6));
        assert_eq!(frame.data(0), None);
        assert_eq!(frame.data(13), None);
        assert_eq!(frame.reserved(), 0);
        assert_eq!(frame.checksum(), sum16(&EXAMPLE));
    }

    #[test]
    fn test_any_payload_mutation_fails_checksum() {
        let good = example_frame();
        for i in HEADER_LEN..DATA_FRAME_TOTAL - 2 {
            let mut bad = good;
            bad[i] = bad[i].wrapping_add(1);
            assert!(
                matches!(DataFrame::decode::<()>(&bad), Err(PmsError::ChecksumMismatch { .. })),
                "mutation at byte {} was not detected",
                i
            );
        }
    }

    #[test]
    fn test_decode_rejects_wrong_length_and_short_input() {
        let mut frame = example_frame();
        frame[3] = 0x04;
        assert!(matches!(DataFrame::decode::<()>(&frame), Err(PmsError::UnexpectedLength(4))));

        let good = example_frame();
        assert!(matches!(
            DataFrame::decode::<()>(&good[..20]),
            Err(PmsError::ShortRead { expected: 32, got: 20 })
        ));
    }

    #[test]
    fn test_new_matches_wire_bytes() {
        let frame = DataFrame::new([10, 20, 30, 10, 20, 30, 1, 2, 3, 4, 5, 6], 0);
        assert_eq!(frame.to_bytes(), example_frame());
        assert_eq!(DataFrame::decode::<()>(&frame.to_bytes()).unwrap(), frame);
    }

    #[test]
    fn test_command_reply_accessors() {
        let reply = CommandReply::new([0xE4, 0x01, 0x01, 0x77]);
        assert_eq!(reply.command(), 0xE4);
        assert_eq!(reply.data(), 0x01);
        assert_eq!(reply.payload(), &[0xE4, 0x01, 0x01, 0x77]);
    }
}
