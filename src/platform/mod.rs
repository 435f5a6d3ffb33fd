// src/platform/mod.rs

// Host bindings for the driver's hardware traits.
pub mod gpio;
pub mod serial;

pub use gpio::SysfsResetLine;
pub use serial::SerialInterface;
