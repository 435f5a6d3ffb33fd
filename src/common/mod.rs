// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod cancel;
pub mod checksum;
pub mod command;
pub mod error;
pub mod frame;
pub mod hal_traits;
pub mod timing;
pub mod types;

// --- Re-export key types/traits/functions for easier access ---

pub use cancel::CancelToken;

pub use checksum::{decode_checksum, encode_checksum, sum16, verify_frame_checksum};

pub use command::{Command, CommandBuffer};

pub use error::PmsError;

pub use frame::{CommandReply, DataFrame, Frame, FIELD_COUNT};

pub use hal_traits::{PmsInstant, PmsSerial, PmsTimer};

// From timing.rs (constants - users can access via common::timing::*)

pub use types::{AveragedReading, MeasurementField, Reading};
