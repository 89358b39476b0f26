//! Sensor error types

use crate::command::Command;
use hid::HidError;
use std::time::Duration;
use thiserror::Error;

/// Sensor-level errors
#[derive(Debug, Error)]
pub enum ThermoError {
    /// Open, write or read failed in the HID transport
    #[error("HID transport error: {0}")]
    Hid(#[from] HidError),

    /// Rejected before any I/O
    #[error("Emissivity {0} out of range, expected 0 < e <= 1")]
    InvalidEmissivity(f64),

    #[error("Unsupported refresh rate '{0}', expected 0.5, 1, 2, 4, 8, 16 or 32 Hz")]
    UnsupportedRefreshRate(String),

    /// The device answered, but the status byte was not 1
    #[error("Device rejected {command}: status {status:#04x}")]
    Rejected { command: Command, status: u8 },

    /// Only empty reports arrived before the command deadline
    #[error("No response to {command} within {deadline:?}")]
    DeadlineExceeded { command: Command, deadline: Duration },
}

impl ThermoError {
    /// True if a transfer timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, ThermoError::Hid(e) if e.is_timeout())
    }
}

/// Type alias for sensor results
pub type Result<T> = std::result::Result<T, ThermoError>;
