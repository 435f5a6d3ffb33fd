// src/driver/codec.rs

use super::SyncDriver;
use crate::common::{
    error::PmsError,
    frame::{
        CommandReply, DataFrame, Frame, COMMAND_REPLY_LENGTH, DATA_FRAME_LENGTH,
        DATA_FRAME_TOTAL, HEADER_LEN, SIGNATURE,
    },
    hal_traits::{PmsSerial, PmsTimer},
    timing,
};
use core::fmt::Debug;
use embedded_hal::digital::OutputPin;
use log::debug;

impl<IF, RST> SyncDriver<IF, RST>
where
    IF: PmsSerial + PmsTimer,
    IF::Error: Debug,
    RST: OutputPin,
{
    /// Reads the next frame from the channel.
    ///
    /// Input is scanned for the `0x42 0x4D` signature, discarding anything
    /// before it. The whole attempt is bounded by
    /// [`timing::MAX_TOTAL_RESPONSE_TIME`] from the moment this is called.
    ///
    /// # Errors
    ///
    /// * `Timeout` - no signature arrived in time.
    /// * `ShortRead` - the channel went quiet after the signature.
    /// * `ChecksumMismatch` - a complete data frame failed verification.
    /// * `UnexpectedLength` - the length field is neither 28 nor 4; input
    ///   is flushed before returning so the next read starts clean.
    /// * `Cancelled`, `Io` - passed through from the channel.
    pub fn read_frame(&mut self) -> Result<Frame, PmsError<IF::Error>> {
        self.check_cancelled()?;
        let deadline = self.interface.now() + timing::MAX_TOTAL_RESPONSE_TIME;

        // 1. Hunt for the signature
        let mut previous: Option<u8> = None;
        loop {
            let byte = self.read_byte_until(deadline)?;
            if previous == Some(SIGNATURE[0]) && byte == SIGNATURE[1] {
                break;
            }
            previous = Some(byte);
        }

        // 2. Length field
        let mut frame = [0u8; DATA_FRAME_TOTAL];
        frame[..2].copy_from_slice(&SIGNATURE);
        let got = self.fill_until(&mut frame[2..HEADER_LEN], deadline)?;
        if got < 2 {
            return Err(PmsError::ShortRead { expected: 2, got });
        }
        let declared = u16::from_be_bytes([frame[2], frame[3]]);

        // 3. Payload
        match declared {
            DATA_FRAME_LENGTH => {
                let expected = DATA_FRAME_LENGTH as usize;
                let got = self.fill_until(&mut frame[HEADER_LEN..], deadline)?;
                if got < expected {
                    return Err(PmsError::ShortRead { expected, got });
                }
                let data = DataFrame::decode(&frame)?;
                debug!("Data frame {:?}", data.fields());
                Ok(Frame::Data(data))
            }
            COMMAND_REPLY_LENGTH => {
                let expected = COMMAND_REPLY_LENGTH as usize;
                let mut payload = [0u8; COMMAND_REPLY_LENGTH as usize];
                let got = self.fill_until(&mut payload, deadline)?;
                if got < expected {
                    return Err(PmsError::ShortRead { expected, got });
                }
                debug!("Command reply {:02X?}", payload);
                Ok(Frame::CommandReply(CommandReply::new(payload)))
            }
            other => {
                debug!("Frame with length {}, resynchronizing", other);
                let now = self.interface.now();
                let remaining = if now < deadline { deadline - now } else { Default::default() };
                let pause = timing::RESYNC_DELAY.min(remaining);
                self.interface.delay_ms(pause.as_millis() as u32);
                self.clear_input()?;
                Err(PmsError::UnexpectedLength(other))
            }
        }
    }
}
