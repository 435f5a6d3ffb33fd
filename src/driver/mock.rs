// src/driver/mock.rs

//! Scripted sensor and reset line for unit tests.

use std::collections::VecDeque;

use core::time::Duration;

use crate::common::{
    cancel::CancelToken,
    checksum::{encode_checksum, sum16},
    command::{CMD_POWER, COMMAND_LEN},
    frame::DataFrame,
    hal_traits::{PmsSerial, PmsTimer},
    timing,
};

// --- Mock Instant ---
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct MockInstant(u64);

impl core::ops::Add<Duration> for MockInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        MockInstant(self.0.saturating_add(rhs.as_micros() as u64))
    }
}

impl core::ops::Sub<MockInstant> for MockInstant {
    type Output = Duration;
    fn sub(self, rhs: MockInstant) -> Duration {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

// --- Mock Comm Error ---
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MockCommError;

/// Simulated sensor on a virtual clock.
///
/// Bytes pushed with `push_bytes` are readable at once. Frames pushed with
/// `push_frame` are streamed one at a time while the sensor is awake and
/// the input buffer is empty, like a sensor in active mode. Complete
/// wake/sleep commands switch `awake` and queue a command reply.
pub(crate) struct MockSensor {
    now_us: u64,
    rx: VecDeque<u8>,
    stream: VecDeque<Vec<u8>>,
    pending_command: Vec<u8>,
    next_trickle_us: u64,
    pub awake: bool,
    pub reply_to_commands: bool,
    /// Bytes accepted before writes start blocking.
    pub write_capacity: Option<usize>,
    /// A byte that becomes readable once per period.
    pub trickle: Option<(u8, Duration)>,
    /// Cancels the token once the clock passes the given millisecond mark.
    pub cancel_after_ms: Option<(u64, CancelToken)>,
    /// Raises an I/O error on reads when set.
    pub fail_reads: bool,
    /// Empty reads wait out the configured read timeout, like a real port.
    pub blocking_reads: bool,
    pub read_timeout: Duration,
    pub written: Vec<u8>,
    pub commands: Vec<Vec<u8>>,
    pub frames_served: usize,
    pub clears: usize,
    pub flushes: usize,
}

impl MockSensor {
    pub fn new() -> Self {
        MockSensor {
            now_us: 0,
            rx: VecDeque::new(),
            stream: VecDeque::new(),
            pending_command: Vec::new(),
            next_trickle_us: 0,
            awake: false,
            reply_to_commands: true,
            write_capacity: None,
            trickle: None,
            cancel_after_ms: None,
            fail_reads: false,
            blocking_reads: false,
            read_timeout: timing::SERIAL_READ_TIMEOUT,
            written: Vec::new(),
            commands: Vec::new(),
            frames_served: 0,
            clears: 0,
            flushes: 0,
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn push_frame(&mut self, frame: &DataFrame) {
        self.stream.push_back(frame.to_bytes().to_vec());
    }

    /// Queues a data frame whose checksum is off by one.
    pub fn push_corrupt_frame(&mut self) {
        let mut bytes = DataFrame::new([7; 12], 0).to_bytes().to_vec();
        let last = bytes.len() - 1;
        bytes[last] = bytes[last].wrapping_add(1);
        self.stream.push_back(bytes);
    }

    pub fn pending_input(&self) -> usize {
        self.rx.len()
    }

    pub fn frames_left(&self) -> usize {
        self.stream.len()
    }

    fn advance_time(&mut self, us: u64) {
        self.now_us = self.now_us.saturating_add(us);
        if let Some((at_ms, token)) = &self.cancel_after_ms {
            if self.now_us >= at_ms * 1000 {
                token.cancel();
            }
        }
    }

    fn handle_command(&mut self, command: &[u8]) {
        self.commands.push(command.to_vec());
        if command[2] == CMD_POWER {
            self.awake = command[4] == 0x01;
        }
        if self.reply_to_commands {
            let mut reply = vec![0x42, 0x4D, 0x00, 0x04, command[2], command[4]];
            let checksum = encode_checksum(sum16(&reply));
            reply.extend_from_slice(&checksum);
            self.rx.extend(reply);
        }
    }
}

impl PmsTimer for MockSensor {
    type Instant = MockInstant;
    fn delay_ms(&mut self, ms: u32) {
        self.advance_time(ms as u64 * 1000);
    }
    fn now(&self) -> Self::Instant {
        MockInstant(self.now_us)
    }
}

impl PmsSerial for MockSensor {
    type Error = MockCommError;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        if self.fail_reads {
            return Err(nb::Error::Other(MockCommError));
        }
        if let Some((byte, period)) = self.trickle {
            if self.now_us >= self.next_trickle_us {
                self.next_trickle_us = self.now_us + period.as_micros() as u64;
                return Ok(byte);
            }
        }
        if self.rx.is_empty() && self.awake {
            if let Some(frame) = self.stream.pop_front() {
                self.frames_served += 1;
                self.rx.extend(frame);
            }
        }
        match self.rx.pop_front() {
            Some(byte) => Ok(byte),
            None => {
                if self.blocking_reads {
                    self.advance_time(self.read_timeout.as_micros() as u64);
                }
                Err(nb::Error::WouldBlock)
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        if let Some(capacity) = self.write_capacity.as_mut() {
            if *capacity == 0 {
                return Err(nb::Error::WouldBlock);
            }
            *capacity -= 1;
        }
        self.written.push(byte);
        self.pending_command.push(byte);
        if self.pending_command.len() == COMMAND_LEN {
            let command = core::mem::take(&mut self.pending_command);
            self.handle_command(&command);
        }
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        self.clears += 1;
        self.rx.clear();
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error> {
        self.read_timeout = timeout;
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MockPinError;

impl embedded_hal::digital::Error for MockPinError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Reset line that records every level written to it.
#[derive(Debug, Default)]
pub(crate) struct MockResetPin {
    /// `false` for low, `true` for high.
    pub levels: Vec<bool>,
    pub fail: bool,
}

impl MockResetPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of complete low-then-high pulses.
    pub fn pulses(&self) -> usize {
        self.levels.windows(2).filter(|w| **w == [false, true]).count()
    }

    fn write(&mut self, level: bool) -> Result<(), MockPinError> {
        if self.fail {
            return Err(MockPinError);
        }
        self.levels.push(level);
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for MockResetPin {
    type Error = MockPinError;
}

impl embedded_hal::digital::OutputPin for MockResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}
