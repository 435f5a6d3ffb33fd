// src/common/error.rs

/// Errors raised by the sensor driver.
///
/// Generic over the I/O error of the serial interface so the same enum works
/// for the host serial port and for test doubles.
#[derive(Debug, thiserror::Error)]
pub enum PmsError<E = ()>
where
    E: core::fmt::Debug,
{
    /// Underlying I/O error from the serial interface.
    #[error("I/O error: {0:?}")]
    Io(E),

    /// No complete frame arrived before the response deadline.
    #[error("Operation timed out")]
    Timeout,

    /// A frame header was seen but the channel went quiet mid-payload.
    #[error("Short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    /// Frame checksum does not match the sum of the preceding bytes.
    #[error("Checksum mismatch: frame carries {expected:#06x}, calculated {calculated:#06x}")]
    ChecksumMismatch { expected: u16, calculated: u16 },

    /// Frame declares a length the protocol does not define.
    #[error("Unexpected frame length {0}")]
    UnexpectedLength(u16),

    /// Fewer command bytes were accepted by the channel than requested.
    #[error("Short write: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    /// Hardware reset line missing or not writable.
    #[error("Reset line unavailable")]
    ResetUnavailable,

    /// Operation interrupted by a shutdown request.
    #[error("Cancelled")]
    Cancelled,
}

impl<E: core::fmt::Debug> PmsError<E> {
    /// True for the failures a frame read reports back to the recovery policy.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            PmsError::Timeout
                | PmsError::ShortRead { .. }
                | PmsError::ChecksumMismatch { .. }
                | PmsError::UnexpectedLength(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e: PmsError = PmsError::ChecksumMismatch { expected: 0x012C, calculated: 0x012D };
        assert_eq!(
            e.to_string(),
            "Checksum mismatch: frame carries 0x012c, calculated 0x012d"
        );
        let e: PmsError = PmsError::ShortWrite { written: 3, expected: 7 };
        assert_eq!(e.to_string(), "Short write: wrote 3 of 7 bytes");
        let e: PmsError<&str> = PmsError::Io("gone");
        assert_eq!(e.to_string(), "I/O error: \"gone\"");
    }

    #[test]
    fn test_decode_failure_classification() {
        assert!(PmsError::<()>::Timeout.is_decode_failure());
        assert!(PmsError::<()>::UnexpectedLength(9).is_decode_failure());
        assert!(PmsError::<()>::ShortRead { expected: 28, got: 3 }.is_decode_failure());
        assert!(!PmsError::<()>::Cancelled.is_decode_failure());
        assert!(!PmsError::<()>::Io(()).is_decode_failure());
    }
}
