// src/main.rs

use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info, warn};
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};

use pms_monitor::acquisition::{
    Acquisition, AcquisitionMode, Aggregator, Outcome, RecoveryPolicy, StatusFile,
};
use pms_monitor::config::Config;
use pms_monitor::driver::SyncDriver;
use pms_monitor::platform::{SerialInterface, SysfsResetLine};
use pms_monitor::CancelToken;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn run(config: Config, cancel: CancelToken) -> Result<Outcome, BoxError> {
    let interface = SerialInterface::open(&config.serial_device)
        .map_err(|e| format!("Cannot open serial device {}: {}", config.serial_device, e))?;
    info!("Opened serial device {}", config.serial_device);

    let reset_line = match &config.reset_gpio {
        Some(path) => match SysfsResetLine::open(path) {
            Ok(line) => Some(line),
            Err(e) => {
                warn!("Reset line {} unavailable, continuing without it: {}", path.display(), e);
                None
            }
        },
        None => None,
    };

    let driver = SyncDriver::new(interface, reset_line).with_cancel_token(cancel);
    let mode = AcquisitionMode::from_interval_secs(config.interval_secs);
    info!(
        "Window of {} readings, mode {:?}, status file {}",
        config.window_size,
        mode,
        config.status_file.display()
    );

    let mut acquisition = Acquisition::new(
        driver,
        Aggregator::new(config.window_size),
        RecoveryPolicy::new(config.reset_threshold, config.abort_threshold),
        mode,
        StatusFile::new(&config.status_file),
    );

    Ok(acquisition.run()?)
}

/// Waits for the acquisition task, cancelling it when a shutdown signal
/// arrives. A dropped sender (signal setup failed) does not cancel.
async fn supervise<T>(
    mut worker: JoinHandle<T>,
    mut shutdown: oneshot::Receiver<()>,
    cancel: &CancelToken,
) -> Result<T, JoinError> {
    tokio::select! {
        joined = &mut worker => joined,
        Ok(()) = &mut shutdown => {
            info!("Shutdown requested, putting the sensor to sleep");
            cancel.cancel();
            worker.await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let loaded = Config::load(config_path.as_deref());

    // Initialize logging; RUST_LOG still overrides the configured level
    let level = loaded
        .as_ref()
        .map(|config| config.log_level)
        .unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancelToken::new();

    // Handle Ctrl+C and SIGTERM by asking the loop to wind down
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Failed to listen for shutdown signals: {}", e);
            return;
        }
        let _ = tx.send(());
    });

    let worker_cancel = cancel.clone();
    let worker = tokio::task::spawn_blocking(move || run(config, worker_cancel));
    let joined = supervise(worker, rx, &cancel).await;

    match joined {
        Ok(Ok(Outcome::Completed)) => {
            info!("Program completed successfully");
            ExitCode::SUCCESS
        }
        Ok(Ok(Outcome::Interrupted)) => {
            info!("Program terminated by user. Exiting gracefully.");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            error!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Acquisition task failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Blocks until `cancel` is set or about two seconds pass, then reports
    /// whether it was cancelled.
    fn wait_for_cancel(cancel: CancelToken) -> JoinHandle<bool> {
        tokio::task::spawn_blocking(move || {
            for _ in 0..2_000 {
                if cancel.is_cancelled() {
                    return true;
                }
                std::thread::sleep(Duration::from_millis(1));
            }
            false
        })
    }

    #[tokio::test]
    async fn test_shutdown_signal_cancels_worker() {
        let cancel = CancelToken::new();
        let (tx, rx) = oneshot::channel();
        tx.send(()).unwrap();
        let cancelled = supervise(wait_for_cancel(cancel.clone()), rx, &cancel)
            .await
            .unwrap();
        assert!(cancelled);
    }

    #[tokio::test]
    async fn test_dropped_signal_sender_lets_worker_finish() {
        let cancel = CancelToken::new();
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);
        let worker = tokio::task::spawn_blocking(|| 7);
        assert_eq!(supervise(worker, rx, &cancel).await.unwrap(), 7);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropped_signal_sender_does_not_cancel_running_worker() {
        let cancel = CancelToken::new();
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);
        let cancelled = supervise(wait_for_cancel(cancel.clone()), rx, &cancel)
            .await
            .unwrap();
        assert!(!cancelled);
        assert!(!cancel.is_cancelled());
    }
}
