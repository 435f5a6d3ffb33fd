// src/config.rs

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;

use crate::acquisition::{aggregator::DEFAULT_WINDOW_SIZE, recovery};

pub const DEFAULT_SERIAL_DEVICE: &str = "/dev/serial0";
pub const DEFAULT_STATUS_FILE: &str = "/run/pms-monitor/status";

/// Settings read from a `KEY=value` file and/or the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `PMS_SERIAL_DEVICE`
    pub serial_device: String,
    /// `PMS_STATUS_FILE`
    pub status_file: PathBuf,
    /// `PMS_RESET_GPIO`: sysfs `value` file of the reset line, if wired.
    pub reset_gpio: Option<PathBuf>,
    /// `PMS_WINDOW_SIZE`
    pub window_size: usize,
    /// `PMS_INTERVAL`: seconds between windows; negative for single-shot.
    pub interval_secs: i64,
    /// `PMS_LOG_LEVEL`
    pub log_level: LevelFilter,
    /// `PMS_RESET_THRESHOLD`
    pub reset_threshold: u32,
    /// `PMS_ABORT_THRESHOLD`
    pub abort_threshold: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },

    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            serial_device: DEFAULT_SERIAL_DEVICE.to_string(),
            status_file: PathBuf::from(DEFAULT_STATUS_FILE),
            reset_gpio: None,
            window_size: DEFAULT_WINDOW_SIZE,
            interval_secs: -1,
            log_level: LevelFilter::Info,
            reset_threshold: recovery::DEFAULT_RESET_THRESHOLD,
            abort_threshold: recovery::DEFAULT_ABORT_THRESHOLD,
        }
    }
}

impl Config {
    /// Reads settings from `path` (or a `.env` file in the working directory
    /// when `None`) and the process environment. Variables set in the
    /// environment win over the file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file_vars = match path {
            Some(path) => read_file(path)?,
            None => match dotenv::from_filename_iter(".env") {
                Ok(iter) => iter
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|source| ConfigError::File {
                        path: PathBuf::from(".env"),
                        source,
                    })?,
                // No `.env` file is fine
                Err(_) => Vec::new(),
            },
        };
        Self::from_vars(file_vars.into_iter().chain(env::vars()))
    }

    /// Builds a configuration from key/value pairs. Unknown keys are ignored;
    /// empty values fall back to the default.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Config::default();

        for (key, value) in vars {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "PMS_SERIAL_DEVICE" => config.serial_device = value.to_string(),
                "PMS_STATUS_FILE" => config.status_file = PathBuf::from(value),
                "PMS_RESET_GPIO" => config.reset_gpio = Some(PathBuf::from(value)),
                "PMS_WINDOW_SIZE" => {
                    config.window_size = parse("PMS_WINDOW_SIZE", value)?;
                    if config.window_size == 0 {
                        return Err(invalid("PMS_WINDOW_SIZE", value, "must be at least 1"));
                    }
                }
                "PMS_INTERVAL" => config.interval_secs = parse("PMS_INTERVAL", value)?,
                "PMS_LOG_LEVEL" => config.log_level = parse("PMS_LOG_LEVEL", value)?,
                "PMS_RESET_THRESHOLD" => {
                    config.reset_threshold = parse("PMS_RESET_THRESHOLD", value)?;
                    if config.reset_threshold == 0 {
                        return Err(invalid("PMS_RESET_THRESHOLD", value, "must be at least 1"));
                    }
                }
                "PMS_ABORT_THRESHOLD" => {
                    config.abort_threshold = parse("PMS_ABORT_THRESHOLD", value)?;
                    if config.abort_threshold == 0 {
                        return Err(invalid("PMS_ABORT_THRESHOLD", value, "must be at least 1"));
                    }
                }
                _ => {}
            }
        }

        Ok(config)
    }
}

/// `KEY=value` pairs of a configuration file, in file order.
fn read_file(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    let file_error = |source| ConfigError::File {
        path: path.to_path_buf(),
        source,
    };
    dotenv::from_path_iter(path)
        .map_err(file_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(file_error)
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| invalid(key, value, &e.to_string()))
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
