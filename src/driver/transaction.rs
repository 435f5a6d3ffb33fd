// src/driver/transaction.rs

use super::SyncDriver;
use crate::common::{
    command::{with_checksum, Command, COMMAND_TEMPLATE_LEN},
    error::PmsError,
    frame::Frame,
    hal_traits::{PmsSerial, PmsTimer},
};
use core::fmt::Debug;
use embedded_hal::digital::OutputPin;
use log::{debug, warn};

impl<IF, RST> SyncDriver<IF, RST>
where
    IF: PmsSerial + PmsTimer,
    IF::Error: Debug,
    RST: OutputPin,
{
    /// Sends `command` and waits for the next frame.
    ///
    /// Returns `Ok(None)` when nothing usable came back: a short write or any
    /// decode failure. Retrying is left to the caller.
    pub fn send_command(&mut self, command: Command) -> Result<Option<Frame>, PmsError<IF::Error>> {
        debug!("Sending {} command", command);
        self.send_template(&command.template())
    }

    /// Appends the checksum to a raw command template, transmits it and
    /// waits for a response frame.
    pub fn send_template(
        &mut self,
        template: &[u8; COMMAND_TEMPLATE_LEN],
    ) -> Result<Option<Frame>, PmsError<IF::Error>> {
        self.check_cancelled()?;
        let buffer = with_checksum(template);

        self.clear_input()?;
        match self.send_command_bytes(&buffer) {
            Ok(()) => {}
            Err(PmsError::ShortWrite { written, expected }) => {
                warn!("Short write: {} of {} command bytes sent", written, expected);
                return Ok(None);
            }
            Err(e) => return Err(e),
        }

        match self.read_frame() {
            Ok(frame) => Ok(Some(frame)),
            Err(e) if e.is_decode_failure() => {
                debug!("No response to command {:02X?}: {}", template, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::{MockResetPin, MockSensor};
    use super::*;
    use crate::common::cancel::CancelToken;

    fn driver(sensor: MockSensor) -> SyncDriver<MockSensor, MockResetPin> {
        SyncDriver::new(sensor, None)
    }

    #[test]
    fn test_wakeup_transmitted_with_checksum() {
        let mut drv = driver(MockSensor::new());
        let reply = drv.send_template(&[0x42, 0x4D, 0xE4, 0x00, 0x01]).unwrap();
        assert_eq!(
            drv.interface().written,
            vec![0x42, 0x4D, 0xE4, 0x00, 0x01, 0x01, 0x2C]
        );
        match reply {
            Some(Frame::CommandReply(r)) => {
                assert_eq!(r.command(), 0xE4);
                assert_eq!(r.data(), 0x01);
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_pending_input_flushed_before_write() {
        let mut sensor = MockSensor::new();
        sensor.push_bytes(&[0x42, 0x4D, 0x00, 0x09]);
        let mut drv = driver(sensor);
        let reply = drv.send_command(Command::Sleep).unwrap();
        assert!(matches!(reply, Some(Frame::CommandReply(_))));
        assert_eq!(drv.interface().clears, 1);
    }

    #[test]
    fn test_no_reply_is_none() {
        let mut sensor = MockSensor::new();
        sensor.reply_to_commands = false;
        let mut drv = driver(sensor);
        assert!(drv.send_command(Command::Wakeup).unwrap().is_none());
        assert_eq!(drv.interface().commands.len(), 1);
    }

    #[test]
    fn test_short_write_is_none_and_not_retried() {
        let mut sensor = MockSensor::new();
        sensor.write_capacity = Some(4);
        let mut drv = driver(sensor);
        assert!(drv.send_command(Command::Sleep).unwrap().is_none());
        assert_eq!(drv.interface().written.len(), 4);
        assert!(drv.interface().commands.is_empty());
    }

    #[test]
    fn test_cancelled_before_write() {
        let token = CancelToken::new();
        token.cancel();
        let mut drv = driver(MockSensor::new()).with_cancel_token(token);
        assert!(matches!(drv.send_command(Command::Wakeup), Err(PmsError::Cancelled)));
        assert!(drv.interface().written.is_empty());
    }
}
