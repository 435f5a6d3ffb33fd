// src/common/timing.rs

use core::time::Duration;

// === Serial channel ===

/// Line speed of the sensor UART (8N1).
pub const BAUD_RATE: u32 = 9600;
/// Per-read timeout configured on the serial channel.
pub const SERIAL_READ_TIMEOUT: Duration = Duration::from_secs(2);
/// Time to clock out one byte at 9600 baud, 10 bits per byte.
pub const BYTE_DURATION: Duration = Duration::from_micros(1042);

// === Frame reception ===

/// Upper bound for a complete frame to arrive, measured from the start of a
/// read attempt. In active mode the sensor emits a frame every 200-2300 ms.
pub const MAX_TOTAL_RESPONSE_TIME: Duration = Duration::from_secs(3);
/// Pause before discarding input after a frame with an unknown length.
pub const RESYNC_DELAY: Duration = Duration::from_millis(100);
/// Back-off between polls of a channel that has nothing to offer.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);
/// Extra allowance on top of the nominal transmit time of a command.
pub const WRITE_SLACK: Duration = Duration::from_millis(20);
/// Time allowed for the transmit buffer to drain.
pub const FLUSH_TIMEOUT: Duration = Duration::from_millis(100);

// === Power management ===

/// Minimum wait after wakeup before concentrations are reliable (fan spin-up).
pub const SETTLING_TIME: Duration = Duration::from_secs(30);
/// How long the reset line is held at each level of a reset pulse.
pub const RESET_HOLD: Duration = Duration::from_millis(500);
/// Longest single delay between two cancellation checks.
pub const CANCEL_CHECK_INTERVAL: Duration = Duration::from_secs(1);
/// Intervals longer than this many settling times put the sensor to sleep
/// between windows.
pub const SLEEP_BETWEEN_WINDOWS_FACTOR: u32 = 3;

