// src/lib.rs

//! Particulate-matter acquisition for PMS-family optical sensors on a
//! serial line: frame decoding, wake/sleep/reset control, error recovery
//! and windowed averaging.

pub mod acquisition;
pub mod common;
pub mod config;
pub mod driver;
pub mod platform;

// Re-export key types for convenience
pub use acquisition::{Acquisition, AcquisitionError, AcquisitionMode, Outcome};
pub use common::{CancelToken, PmsError};
pub use config::Config;
pub use driver::{PowerState, SyncDriver};
