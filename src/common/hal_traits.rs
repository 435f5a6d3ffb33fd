// src/common/hal_traits.rs

use core::fmt::Debug;
use core::ops::{Add, Sub};
use core::time::Duration;

/// A point in time as reported by a [`PmsTimer`].
pub trait PmsInstant: Copy + Ord + Add<Duration, Output = Self> + Sub<Self, Output = Duration> {}

impl<T> PmsInstant for T where T: Copy + Ord + Add<Duration, Output = T> + Sub<T, Output = Duration> {}

/// Abstraction for timer/delay operations.
pub trait PmsTimer {
    type Instant: PmsInstant;

    /// Delay for at least the specified number of milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Current time, monotonic.
    fn now(&self) -> Self::Instant;
}

/// Abstraction for the byte-oriented serial channel to the sensor.
pub trait PmsSerial {
    /// Associated error type for communication errors.
    type Error: Debug;

    /// Attempts to read a single byte.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` if nothing arrived within the
    /// channel's own per-read timeout.
    fn read_byte(&mut self) -> nb::Result<u8, Self::Error>;

    /// Attempts to write a single byte.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` if the byte was not accepted.
    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error>;

    /// Attempts to drain the transmit buffer.
    fn flush(&mut self) -> nb::Result<(), Self::Error>;

    /// Discards every byte received but not yet read.
    fn clear_input(&mut self) -> Result<(), Self::Error>;

    /// Sets how long a single `read_byte` may block before reporting
    /// `WouldBlock`.
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), Self::Error>;
}
