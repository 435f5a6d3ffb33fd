// src/driver/power.rs

use super::{PowerState, SyncDriver};
use crate::common::{
    command::Command,
    error::PmsError,
    hal_traits::{PmsSerial, PmsTimer},
    timing,
};
use core::fmt::Debug;
use embedded_hal::digital::OutputPin;
use log::{info, warn};

impl<IF, RST> SyncDriver<IF, RST>
where
    IF: PmsSerial + PmsTimer,
    IF::Error: Debug,
    RST: OutputPin,
{
    /// Wakes the sensor and waits out the settling time.
    ///
    /// An unanswered wakeup is followed by a reset pulse and one more
    /// wakeup. The settling wait happens whatever the sensor answered:
    /// concentrations read before it are unreliable.
    pub fn wake(&mut self) -> Result<(), PmsError<IF::Error>> {
        info!("Waking sensor (state {})", self.state);
        if self.send_command(Command::Wakeup)?.is_none() {
            warn!("No response to wakeup, resetting sensor");
            self.reset();
            if self.send_command(Command::Wakeup)?.is_none() {
                warn!("No response to wakeup after reset");
            }
        }

        info!("Waiting {}s for sensor to settle", self.settling_time.as_secs());
        self.delay(self.settling_time)?;
        self.state = PowerState::Awake;
        self.clear_input()?;
        Ok(())
    }

    /// Puts the sensor to sleep. The reply is not required.
    ///
    /// Runs to completion even after a shutdown request.
    pub fn sleep(&mut self) -> Result<(), PmsError<IF::Error>> {
        info!("Putting sensor to sleep");
        self.uninterruptible(|driver| {
            if driver.send_command(Command::Sleep)?.is_none() {
                warn!("No response to sleep command");
            }
            driver.clear_input()?;
            driver.state = PowerState::Asleep;
            Ok(())
        })
    }

    /// Pulses the reset line. Best effort: a missing or failing line is
    /// logged and otherwise ignored. Returns whether a pulse was sent.
    pub fn reset(&mut self) -> bool {
        match self.pulse_reset_line() {
            Ok(()) => {
                info!("Sensor reset");
                true
            }
            Err(e) => {
                warn!("Sensor reset skipped: {}", e);
                false
            }
        }
    }

    fn pulse_reset_line(&mut self) -> Result<(), PmsError<IF::Error>> {
        let pin = self.reset_pin.as_mut().ok_or(PmsError::ResetUnavailable)?;
        let hold_ms = timing::RESET_HOLD.as_millis() as u32;

        self.state = PowerState::Unknown;
        pin.set_low().map_err(|e| {
            warn!("Reset line write failed: {:?}", e);
            PmsError::ResetUnavailable
        })?;
        self.interface.delay_ms(hold_ms);

        pin.set_high().map_err(|e| {
            warn!("Reset line write failed: {:?}", e);
            PmsError::ResetUnavailable
        })?;
        self.interface.delay_ms(hold_ms);
        Ok(())
    }
}
