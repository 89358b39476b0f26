//! Common utilities for usbthermo
//!
//! Shared by the transport, protocol and command-line crates: logging setup,
//! the error type that setup reports, and a hex-dump formatter used when
//! tracing raw HID reports.

pub mod error;
pub mod hexdump;
pub mod logging;

pub use error::{Error, Result};
pub use hexdump::hex_dump;
pub use logging::setup_logging;
