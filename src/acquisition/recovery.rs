// src/acquisition/recovery.rs

use core::fmt;

/// Default number of back-to-back frame errors that trigger a sensor reset.
pub const DEFAULT_RESET_THRESHOLD: u32 = 2;
/// Default number of frame errors that abort (or back off) the acquisition.
pub const DEFAULT_ABORT_THRESHOLD: u32 = 10;

/// What the acquisition loop should do after a failed frame read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Try the next frame.
    Continue,
    /// Pulse the reset line and wake the sensor again.
    ResetSensor,
    /// Wait one inter-window interval, then resume.
    Backoff,
    /// Give up on this run.
    Abort,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryAction::Continue => write!(f, "continue"),
            RecoveryAction::ResetSensor => write!(f, "reset sensor"),
            RecoveryAction::Backoff => write!(f, "back off"),
            RecoveryAction::Abort => write!(f, "abort"),
        }
    }
}

/// Tracks frame errors and picks the recovery action.
///
/// Two counters are kept: errors since the last reset (`consecutive`) and
/// errors since the last emitted window (`cumulative`). A good frame clears
/// neither; sporadic errors across a window still add up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPolicy {
    reset_threshold: u32,
    abort_threshold: u32,
    consecutive: u32,
    cumulative: u32,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RESET_THRESHOLD, DEFAULT_ABORT_THRESHOLD)
    }
}

impl RecoveryPolicy {
    pub fn new(reset_threshold: u32, abort_threshold: u32) -> Self {
        RecoveryPolicy {
            reset_threshold,
            abort_threshold,
            consecutive: 0,
            cumulative: 0,
        }
    }

    /// Records one failed frame read and decides what to do about it.
    ///
    /// The reset check runs first; only when it does not fire is the abort
    /// threshold consulted. `continuous` selects back-off over abort.
    pub fn record_failure(&mut self, continuous: bool) -> RecoveryAction {
        self.consecutive += 1;
        self.cumulative += 1;

        if self.consecutive >= self.reset_threshold {
            self.consecutive = 0;
            RecoveryAction::ResetSensor
        } else if self.cumulative >= self.abort_threshold {
            if continuous {
                self.cumulative = 0;
                RecoveryAction::Backoff
            } else {
                RecoveryAction::Abort
            }
        } else {
            RecoveryAction::Continue
        }
    }

    /// Called when a full window was emitted.
    pub fn window_completed(&mut self) {
        self.cumulative = 0;
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive
    }

    pub fn cumulative_errors(&self) -> u32 {
        self.cumulative
    }
}
