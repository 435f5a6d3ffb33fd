// src/common/command.rs

//! Host-to-sensor command definitions.
//!
//! Every command is a five byte template `0x42 0x4D <cmd> <data_hi> <data_lo>`
//! followed on the wire by the big-endian sum of those five bytes.

use core::fmt;

use arrayvec::ArrayVec;

use super::checksum::{encode_checksum, sum16};
use super::frame::SIGNATURE;

/// Length of a command template, before the checksum is appended.
pub const COMMAND_TEMPLATE_LEN: usize = 5;
/// Length of a command as transmitted.
pub const COMMAND_LEN: usize = COMMAND_TEMPLATE_LEN + 2;

/// Command byte selecting the sleep/wakeup function.
pub const CMD_POWER: u8 = 0xE4;

/// Buffer holding one formatted command.
pub type CommandBuffer = ArrayVec<u8, COMMAND_LEN>;

/// Commands the host issues to the sensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave sleep mode and start the fan (`0xE4`, data `0x0001`).
    Wakeup,
    /// Enter sleep mode and stop the fan (`0xE4`, data `0x0000`).
    Sleep,
}

impl Command {
    /// Raw template bytes, without checksum.
    pub const fn template(&self) -> [u8; COMMAND_TEMPLATE_LEN] {
        let data = match self {
            Command::Wakeup => 0x01,
            Command::Sleep => 0x00,
        };
        [SIGNATURE[0], SIGNATURE[1], CMD_POWER, 0x00, data]
    }

    /// Formats the command for transmission: template plus big-endian checksum.
    pub fn format_into(&self) -> CommandBuffer {
        with_checksum(&self.template())
    }
}

/// Appends the sum checksum of `template` to a copy of it.
pub fn with_checksum(template: &[u8; COMMAND_TEMPLATE_LEN]) -> CommandBuffer {
    let mut buffer = CommandBuffer::new();
    buffer.extend(template.iter().copied());
    buffer.extend(encode_checksum(sum16(template)));
    buffer
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Wakeup => write!(f, "wakeup"),
            Command::Sleep => write!(f, "sleep"),
        }
    }
}
