// src/driver/mod.rs

//! Synchronous driver for PMS-family particulate sensors.
//!
//! The driver owns the serial channel and the optional hardware reset line.
//! It is split by concern:
//!
//! * `io_helpers` - deadline-driven byte I/O and cancellable delays
//! * `codec` - frame synchronization and decoding
//! * `transaction` - command transmission and response wait
//! * `power` - wake/sleep/reset sequencing

use core::fmt::{self, Debug};
use core::time::Duration;

use embedded_hal::digital::OutputPin;

use crate::common::{
    cancel::CancelToken,
    error::PmsError,
    hal_traits::{PmsSerial, PmsTimer},
    timing,
};

mod codec;
mod io_helpers;
mod power;
mod transaction;

#[cfg(test)]
pub(crate) mod mock;

/// Power state of the sensor as last commanded by the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PowerState {
    Awake,
    Asleep,
    /// After a reset pulse, or before the first command.
    Unknown,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerState::Awake => write!(f, "awake"),
            PowerState::Asleep => write!(f, "asleep"),
            PowerState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Represents one sensor on one serial channel, driven synchronously.
pub struct SyncDriver<IF, RST>
where
    IF: PmsSerial + PmsTimer,
    RST: OutputPin,
{
    interface: IF,
    reset_pin: Option<RST>,
    state: PowerState,
    settling_time: Duration,
    cancel: CancelToken,
}

impl<IF, RST> SyncDriver<IF, RST>
where
    IF: PmsSerial + PmsTimer,
    IF::Error: Debug,
    RST: OutputPin,
{
    /// Creates a driver. Pass `None` as `reset_pin` when no reset line is wired.
    pub fn new(interface: IF, reset_pin: Option<RST>) -> Self {
        SyncDriver {
            interface,
            reset_pin,
            state: PowerState::Unknown,
            settling_time: timing::SETTLING_TIME,
            cancel: CancelToken::new(),
        }
    }

    /// Shares a shutdown flag with the driver; long waits and frame reads
    /// return [`PmsError::Cancelled`] once it is set.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Overrides the post-wakeup settling time.
    pub fn with_settling_time(mut self, settling_time: Duration) -> Self {
        self.settling_time = settling_time;
        self
    }

    pub fn power_state(&self) -> PowerState {
        self.state
    }

    pub fn settling_time(&self) -> Duration {
        self.settling_time
    }

    pub fn interface(&self) -> &IF {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut IF {
        &mut self.interface
    }

    pub fn reset_pin(&self) -> Option<&RST> {
        self.reset_pin.as_ref()
    }

    /// Releases the serial channel and reset line.
    pub fn release(self) -> (IF, Option<RST>) {
        (self.interface, self.reset_pin)
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), PmsError<IF::Error>> {
        if self.cancel.is_cancelled() {
            Err(PmsError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Runs `f` with cancellation suppressed, for the shutdown sequence.
    pub(crate) fn uninterruptible<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let token = core::mem::take(&mut self.cancel);
        let result = f(self);
        self.cancel = token;
        result
    }
}

impl<IF, RST> Debug for SyncDriver<IF, RST>
where
    IF: PmsSerial + PmsTimer,
    RST: OutputPin,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncDriver")
            .field("state", &self.state)
            .field("reset_line", &self.reset_pin.is_some())
            .field("settling_time", &self.settling_time)
            .finish()
    }
}
