// src/platform/gpio.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

/// Reset line driven through a sysfs GPIO `value` file
/// (e.g. `/sys/class/gpio/gpio17/value`), exported as an output beforehand.
#[derive(Debug, Clone)]
pub struct SysfsResetLine {
    value_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
#[error("GPIO write to {path} failed: {source}")]
pub struct SysfsPinError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl embedded_hal::digital::Error for SysfsPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl SysfsResetLine {
    /// Opens the line after checking the `value` file is present and writable.
    pub fn open(value_path: impl Into<PathBuf>) -> io::Result<Self> {
        let value_path = value_path.into();
        let metadata = fs::metadata(&value_path)?;
        if metadata.permissions().readonly() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", value_path.display()),
            ));
        }
        Ok(SysfsResetLine { value_path })
    }

    pub fn path(&self) -> &Path {
        &self.value_path
    }

    fn write(&mut self, level: &str) -> Result<(), SysfsPinError> {
        fs::write(&self.value_path, level).map_err(|source| SysfsPinError {
            path: self.value_path.clone(),
            source,
        })
    }
}

impl ErrorType for SysfsResetLine {
    type Error = SysfsPinError;
}

impl OutputPin for SysfsResetLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write("0")
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write("1")
    }
}
