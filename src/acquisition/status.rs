// src/acquisition/status.rs

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::common::types::AveragedReading;

/// Destination for averaged records.
pub trait RecordSink {
    fn persist(&mut self, record: &AveragedReading) -> io::Result<()>;
}

/// Keeps every record in memory.
impl RecordSink for Vec<AveragedReading> {
    fn persist(&mut self, record: &AveragedReading) -> io::Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Status file holding the latest averaged record on a single line.
///
/// Each write goes to `<path>.tmp`, is fsynced and then renamed over the
/// target, so readers never see a partial line.
#[derive(Debug, Clone)]
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StatusFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl RecordSink for StatusFile {
    fn persist(&mut self, record: &AveragedReading) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let line = record
            .status_line()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let temp = self.temp_path();
        {
            let mut file = File::create(&temp)?;
            writeln!(file, "{}", line)?;
            file.sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        debug!("Status written to {}", self.path.display());
        Ok(())
    }
}
