// src/driver/io_helpers.rs

use super::SyncDriver;
use crate::common::{
    error::PmsError,
    hal_traits::{PmsSerial, PmsTimer},
    timing,
};
use core::fmt::Debug;
use core::time::Duration;
use embedded_hal::digital::OutputPin;
use nb::Result as NbResult;

impl<IF, RST> SyncDriver<IF, RST>
where
    IF: PmsSerial + PmsTimer,
    IF::Error: Debug,
    RST: OutputPin,
{
    /// Executes a non-blocking I/O operation (`f`) repeatedly until it
    /// stops returning `WouldBlock` or `deadline` passes.
    pub(super) fn execute_blocking_io_until<FN, T>(
        &mut self,
        deadline: IF::Instant,
        mut f: FN,
    ) -> Result<T, PmsError<IF::Error>>
    where
        FN: FnMut(&mut IF) -> NbResult<T, IF::Error>,
    {
        loop {
            match f(&mut self.interface) {
                Ok(result) => return Ok(result),
                Err(nb::Error::WouldBlock) => {
                    self.check_cancelled()?;
                    if self.interface.now() >= deadline {
                        return Err(PmsError::Timeout);
                    }
                    self.interface.delay_ms(timing::POLL_INTERVAL.as_millis() as u32);
                }
                Err(nb::Error::Other(e)) => return Err(PmsError::Io(e)),
            }
        }
    }

    pub(super) fn execute_blocking_io_with_timeout<FN, T>(
        &mut self,
        timeout: Duration,
        f: FN,
    ) -> Result<T, PmsError<IF::Error>>
    where
        FN: FnMut(&mut IF) -> NbResult<T, IF::Error>,
    {
        let deadline = self.interface.now() + timeout;
        self.execute_blocking_io_until(deadline, f)
    }

    /// Reads one byte, never blocking past `deadline`.
    ///
    /// The channel's per-read timeout is clamped to the time left, so a
    /// silent line cannot hold a read open beyond the deadline.
    pub(super) fn read_byte_until(&mut self, deadline: IF::Instant) -> Result<u8, PmsError<IF::Error>> {
        self.execute_blocking_io_until(deadline, |iface| {
            let now = iface.now();
            let remaining = if now < deadline { deadline - now } else { Duration::ZERO };
            iface
                .set_read_timeout(remaining.min(timing::SERIAL_READ_TIMEOUT))
                .map_err(nb::Error::Other)?;
            iface.read_byte()
        })
    }

    /// Reads into `buf` until it is full or `deadline` passes.
    /// Returns how many bytes arrived.
    pub(super) fn fill_until(
        &mut self,
        buf: &mut [u8],
        deadline: IF::Instant,
    ) -> Result<usize, PmsError<IF::Error>> {
        for (i, slot) in buf.iter_mut().enumerate() {
            match self.read_byte_until(deadline) {
                Ok(byte) => *slot = byte,
                Err(PmsError::Timeout) => return Ok(i),
                Err(e) => return Err(e),
            }
        }
        Ok(buf.len())
    }

    /// Writes `bytes` and drains the transmit buffer.
    ///
    /// A byte the channel refuses to take within the nominal transmit time
    /// ends the write with [`PmsError::ShortWrite`]; it is not retried.
    pub(super) fn send_command_bytes(&mut self, bytes: &[u8]) -> Result<(), PmsError<IF::Error>> {
        let write_timeout = timing::BYTE_DURATION * bytes.len() as u32 + timing::WRITE_SLACK;
        let deadline = self.interface.now() + write_timeout;

        for (written, byte) in bytes.iter().enumerate() {
            match self.execute_blocking_io_until(deadline, |iface| iface.write_byte(*byte)) {
                Ok(()) => {}
                Err(PmsError::Timeout) => {
                    return Err(PmsError::ShortWrite { written, expected: bytes.len() })
                }
                Err(e) => return Err(e),
            }
        }

        self.execute_blocking_io_with_timeout(timing::FLUSH_TIMEOUT, |iface| iface.flush())
    }

    /// Discards pending input on the serial channel.
    pub fn clear_input(&mut self) -> Result<(), PmsError<IF::Error>> {
        self.interface.clear_input().map_err(PmsError::Io)
    }

    /// Waits `duration`, checking for cancellation at least once a second.
    pub fn delay(&mut self, duration: Duration) -> Result<(), PmsError<IF::Error>> {
        let mut remaining = duration;
        loop {
            self.check_cancelled()?;
            if remaining.is_zero() {
                return Ok(());
            }
            let step = remaining.min(timing::CANCEL_CHECK_INTERVAL);
            self.interface.delay_ms(step.as_millis() as u32);
            remaining -= step;
        }
    }
}
