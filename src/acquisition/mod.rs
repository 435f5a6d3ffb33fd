// src/acquisition/mod.rs

//! Acquisition loop: wakes the sensor, collects readings into windows,
//! persists each averaged window and sleeps the sensor on the way out.

use core::fmt::Debug;
use core::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};
use time::OffsetDateTime;

use crate::common::{
    error::PmsError,
    frame::Frame,
    hal_traits::{PmsSerial, PmsTimer},
    timing,
    types::{AveragedReading, Reading},
};
use crate::driver::{PowerState, SyncDriver};

pub mod aggregator;
pub mod recovery;
pub mod status;

pub use aggregator::Aggregator;
pub use recovery::{RecoveryAction, RecoveryPolicy};
pub use status::{RecordSink, StatusFile};

/// Whether the loop stops after one window or keeps going.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AcquisitionMode {
    SingleShot,
    Continuous { interval: Duration },
}

impl AcquisitionMode {
    /// Negative intervals select single-shot mode.
    pub fn from_interval_secs(interval: i64) -> Self {
        if interval < 0 {
            AcquisitionMode::SingleShot
        } else {
            AcquisitionMode::Continuous { interval: Duration::from_secs(interval as u64) }
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, AcquisitionMode::Continuous { .. })
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Single-shot window persisted.
    Completed,
    /// Shutdown requested.
    Interrupted,
}

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError<E>
where
    E: Debug,
{
    #[error("Aborted after {cumulative_errors} frame errors")]
    Aborted { cumulative_errors: u32 },

    #[error("Failed to persist averaged record: {0}")]
    Persist(#[source] std::io::Error),

    #[error("Sensor driver error: {0}")]
    Driver(PmsError<E>),
}

/// States of the acquisition loop.
#[derive(Debug)]
enum LoopState<E: Debug> {
    Initializing,
    Acquiring,
    WindowReady(AveragedReading),
    /// Sensor put to sleep for the interval, woken afterwards.
    Sleeping(Duration),
    /// Sensor left awake while waiting for the interval.
    Idling(Duration),
    Terminating(Result<Outcome, AcquisitionError<E>>),
}

/// The acquisition loop, owning the driver for its lifetime.
pub struct Acquisition<IF, RST, S>
where
    IF: PmsSerial + PmsTimer,
    RST: OutputPin,
    S: RecordSink,
{
    driver: SyncDriver<IF, RST>,
    aggregator: Aggregator,
    policy: RecoveryPolicy,
    mode: AcquisitionMode,
    sink: S,
    windows: u64,
}

impl<IF, RST, S> Acquisition<IF, RST, S>
where
    IF: PmsSerial + PmsTimer,
    IF::Error: Debug,
    RST: OutputPin,
    S: RecordSink,
{
    pub fn new(
        driver: SyncDriver<IF, RST>,
        aggregator: Aggregator,
        policy: RecoveryPolicy,
        mode: AcquisitionMode,
        sink: S,
    ) -> Self {
        Acquisition {
            driver,
            aggregator,
            policy,
            mode,
            sink,
            windows: 0,
        }
    }

    pub fn driver(&self) -> &SyncDriver<IF, RST> {
        &self.driver
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    /// Number of windows persisted so far.
    pub fn windows(&self) -> u64 {
        self.windows
    }

    /// Runs until the single-shot window is persisted, a shutdown is
    /// requested or the error policy gives up. The sensor is put to sleep
    /// before returning in every case.
    pub fn run(&mut self) -> Result<Outcome, AcquisitionError<IF::Error>> {
        info!("Starting acquisition ({:?}, window of {})", self.mode, self.aggregator.window_size());
        let mut state = LoopState::Initializing;
        loop {
            state = match state {
                LoopState::Initializing => match self.driver.wake() {
                    Ok(()) => LoopState::Acquiring,
                    Err(e) => Self::on_driver_error(e),
                },
                LoopState::Acquiring => self.acquire(),
                LoopState::WindowReady(record) => self.window_ready(record),
                LoopState::Sleeping(interval) => self.sleep_between_windows(interval),
                LoopState::Idling(interval) => self.idle_between_windows(interval),
                LoopState::Terminating(result) => return self.terminate(result),
            };
        }
    }

    fn acquire(&mut self) -> LoopState<IF::Error> {
        match self.driver.read_frame() {
            Ok(Frame::Data(frame)) => {
                let reading = Reading::new(frame, OffsetDateTime::now_utc());
                match self.aggregator.push(reading) {
                    Some(record) => LoopState::WindowReady(record),
                    None => LoopState::Acquiring,
                }
            }
            Ok(Frame::CommandReply(reply)) => {
                debug!("Ignoring command reply {:02X?} while acquiring", reply.payload());
                LoopState::Acquiring
            }
            Err(e) if e.is_decode_failure() => self.recover(e),
            Err(e) => Self::on_driver_error(e),
        }
    }

    fn recover(&mut self, failure: PmsError<IF::Error>) -> LoopState<IF::Error> {
        let action = self.policy.record_failure(self.mode.is_continuous());
        warn!(
            "Frame error: {} (consecutive {}, cumulative {}), {}",
            failure,
            self.policy.consecutive_errors(),
            self.policy.cumulative_errors(),
            action
        );
        match action {
            RecoveryAction::Continue => LoopState::Acquiring,
            RecoveryAction::ResetSensor => {
                self.driver.reset();
                match self.driver.wake() {
                    Ok(()) => LoopState::Acquiring,
                    Err(e) => Self::on_driver_error(e),
                }
            }
            RecoveryAction::Backoff => {
                let interval = match self.mode {
                    AcquisitionMode::Continuous { interval } => interval,
                    AcquisitionMode::SingleShot => Duration::ZERO,
                };
                match self.driver.delay(interval).and_then(|()| self.driver.clear_input()) {
                    Ok(()) => LoopState::Acquiring,
                    Err(e) => Self::on_driver_error(e),
                }
            }
            RecoveryAction::Abort => {
                error!("Giving up after {} frame errors", self.policy.cumulative_errors());
                LoopState::Terminating(Err(AcquisitionError::Aborted {
                    cumulative_errors: self.policy.cumulative_errors(),
                }))
            }
        }
    }

    fn window_ready(&mut self, record: AveragedReading) -> LoopState<IF::Error> {
        self.policy.window_completed();
        info!("Window averaged: {}", record);
        if let Err(e) = self.sink.persist(&record) {
            error!("Failed to persist record: {}", e);
            return LoopState::Terminating(Err(AcquisitionError::Persist(e)));
        }
        self.windows += 1;

        match self.mode {
            AcquisitionMode::SingleShot => LoopState::Terminating(Ok(Outcome::Completed)),
            AcquisitionMode::Continuous { interval } => {
                let threshold = self.driver.settling_time() * timing::SLEEP_BETWEEN_WINDOWS_FACTOR;
                if interval > threshold {
                    LoopState::Sleeping(interval)
                } else {
                    LoopState::Idling(interval)
                }
            }
        }
    }

    fn sleep_between_windows(&mut self, interval: Duration) -> LoopState<IF::Error> {
        info!("Sleeping sensor for {}s", interval.as_secs());
        let result = self
            .driver
            .sleep()
            .and_then(|()| self.driver.delay(interval))
            .and_then(|()| self.driver.wake());
        match result {
            Ok(()) => LoopState::Acquiring,
            Err(e) => Self::on_driver_error(e),
        }
    }

    fn idle_between_windows(&mut self, interval: Duration) -> LoopState<IF::Error> {
        debug!("Waiting {}s with sensor awake", interval.as_secs());
        match self.driver.delay(interval).and_then(|()| self.driver.clear_input()) {
            Ok(()) => LoopState::Acquiring,
            Err(e) => Self::on_driver_error(e),
        }
    }

    fn terminate(
        &mut self,
        result: Result<Outcome, AcquisitionError<IF::Error>>,
    ) -> Result<Outcome, AcquisitionError<IF::Error>> {
        if self.driver.power_state() != PowerState::Asleep {
            if let Err(e) = self.driver.sleep() {
                warn!("Could not put sensor to sleep: {}", e);
            }
        }
        match &result {
            Ok(outcome) => info!("Acquisition finished: {:?}", outcome),
            Err(e) => error!("Acquisition failed: {}", e),
        }
        result
    }

    fn on_driver_error(e: PmsError<IF::Error>) -> LoopState<IF::Error> {
        match e {
            PmsError::Cancelled => {
                info!("Shutdown requested");
                LoopState::Terminating(Ok(Outcome::Interrupted))
            }
            e => LoopState::Terminating(Err(AcquisitionError::Driver(e))),
        }
    }
}
