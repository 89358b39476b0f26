//! Command framing
//!
//! A command is four bytes. On the wire it becomes a 65-byte HID report:
//! report ID 0, the four command bytes, then zero padding.

use crate::types::RefreshRate;
use std::fmt;

/// Size of every response, and of a report without its report-ID byte
pub const PACKET_SIZE: usize = 64;

/// Size of an outgoing report including the report-ID byte
pub const REPORT_SIZE: usize = PACKET_SIZE + 1;

/// One raw response from the sensor
pub type Response = [u8; PACKET_SIZE];

/// Status byte the sensor returns for "ready" / "accepted"
pub const ACK: u8 = 0x01;

/// Which two rows a split transfer carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    /// Rows 0 and 1
    Upper,
    /// Rows 2 and 3
    Lower,
}

impl Half {
    pub fn index(self) -> u8 {
        match self {
            Half::Upper => 0,
            Half::Lower => 1,
        }
    }

    /// First frame row carried by this half
    pub fn first_row(self) -> usize {
        usize::from(self.index()) * 2
    }
}

/// Sensor commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ask whether a frame is ready
    Status,
    ReadFrame(Half),
    SetRefreshRate(RefreshRate),
    /// Emissivity in thousandths
    SetEmissivity(u16),
    ReadEepromPage(u8),
    /// Raw thermopile readings
    ReadThermopile(Half),
    /// PTAT and Vcp
    ReadReference,
    /// Arbitrary command bytes
    Raw([u8; 4]),
}

impl Command {
    /// The four command bytes
    pub fn bytes(&self) -> [u8; 4] {
        match *self {
            Command::Status => [0x00, 0x00, 0x00, 0x00],
            Command::ReadFrame(half) => [0x01, half.index(), 0x00, 0x00],
            Command::SetRefreshRate(rate) => [0x03, rate.code(), 0x00, 0x00],
            Command::SetEmissivity(value) => {
                let [low, high] = value.to_le_bytes();
                [0x04, low, high, 0x00]
            }
            Command::ReadEepromPage(page) => [0x80, page, 0x00, 0x00],
            Command::ReadThermopile(half) => [0x81, half.index(), 0x00, 0x00],
            Command::ReadReference => [0x82, 0x00, 0x00, 0x00],
            Command::Raw(bytes) => bytes,
        }
    }

    /// Full outgoing report, report ID 0 first
    pub fn report(&self) -> [u8; REPORT_SIZE] {
        let mut report = [0u8; REPORT_SIZE];
        report[1..5].copy_from_slice(&self.bytes());
        report
    }

    fn name(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::ReadFrame(_) => "read frame",
            Command::SetRefreshRate(_) => "set refresh rate",
            Command::SetEmissivity(_) => "set emissivity",
            Command::ReadEepromPage(_) => "read EEPROM page",
            Command::ReadThermopile(_) => "read thermopile",
            Command::ReadReference => "read PTAT/Vcp",
            Command::Raw(_) => "command",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.bytes();
        write!(
            f,
            "{} [{:02x} {:02x} {:02x} {:02x}]",
            self.name(),
            a,
            b,
            c,
            d
        )
    }
}
