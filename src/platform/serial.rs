// src/platform/serial.rs

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use serialport::{ClearBuffer, SerialPort};

use crate::common::{
    hal_traits::{PmsSerial, PmsTimer},
    timing,
};

/// Host serial port opened at 9600 8N1 with the protocol's read timeout.
pub struct SerialInterface {
    port: Box<dyn SerialPort>,
    read_timeout: Duration,
}

impl SerialInterface {
    pub fn open(path: &str) -> Result<Self, serialport::Error> {
        let port = serialport::new(path, timing::BAUD_RATE)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(timing::SERIAL_READ_TIMEOUT)
            .open()?;
        Ok(SerialInterface {
            port,
            read_timeout: timing::SERIAL_READ_TIMEOUT,
        })
    }
}

fn would_block(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

impl PmsTimer for SerialInterface {
    type Instant = Instant;

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl PmsSerial for SerialInterface {
    type Error = io::Error;

    fn read_byte(&mut self) -> nb::Result<u8, io::Error> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Ok(buf[0]),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) if would_block(&e) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), io::Error> {
        match self.port.write(&[byte]) {
            Ok(1) => Ok(()),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) if would_block(&e) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn flush(&mut self) -> nb::Result<(), io::Error> {
        match self.port.flush() {
            Ok(()) => Ok(()),
            Err(e) if would_block(&e) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn clear_input(&mut self) -> Result<(), io::Error> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), io::Error> {
        // Most reads keep the default timeout; skip the call when unchanged.
        if timeout != self.read_timeout {
            self.port.set_timeout(timeout).map_err(io::Error::from)?;
            self.read_timeout = timeout;
        }
        Ok(())
    }
}
