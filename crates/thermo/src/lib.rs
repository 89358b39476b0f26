//! Driver for the OTK-THG01/02 USB thermal imaging sensor
//!
//! The sensor is a 16x4 thermopile array behind a HID interface. Every
//! exchange is one 65-byte report out (report ID 0 plus a 4-byte command) and
//! one 64-byte report back. This crate frames the commands, polls for the
//! answers and decodes:
//! - calibrated temperature frames ([`ThermalFrame`])
//! - raw PTAT, Vcp and thermopile readings ([`RawSensorData`])
//! - the 256-byte calibration EEPROM ([`EepromImage`])
//!
//! # Example
//!
//! ```no_run
//! use thermo::{RefreshRate, UsbThermo};
//!
//! thermo::init()?;
//! let mut sensor = UsbThermo::open()?;
//!
//! sensor.set_emissivity(0.95)?;
//! sensor.set_refresh_rate(RefreshRate::Hz2)?;
//!
//! let frame = sensor.read_frame()?;
//! for row in frame.rows() {
//!     let line: Vec<String> = row.iter().map(|p| format!("{:.1}", p.temperature)).collect();
//!     println!("{}", line.join(" "));
//! }
//!
//! sensor.close();
//! thermo::exit();
//! # Ok::<(), thermo::ThermoError>(())
//! ```

pub mod command;
pub mod decode;
pub mod device;
pub mod error;
pub mod types;

pub use command::{Command, Half, PACKET_SIZE, REPORT_SIZE, Response};
pub use device::{
    DEFAULT_COMMAND_DEADLINE, POLL_INTERVAL, PRODUCT_ID, UsbThermo, VENDOR_ID, exit, init,
};
pub use error::{Result, ThermoError};
pub use hid::{HidInterfaceList, HidInterfacePath};
pub use types::{
    EEPROM_PAGE_SIZE, EEPROM_PAGES, EEPROM_SIZE, EepromImage, HEIGHT, Pixel, PixelStatus,
    RawSensorData, RefreshRate, ThermalFrame, WIDTH,
};
