//! HID transport over libusb
//!
//! Raw interrupt-transfer access to HID-class USB interfaces, bypassing the
//! kernel HID driver. This crate handles:
//! - Enumeration of HID interfaces, filtered by vendor/product ID
//! - Opening one interface by its [`HidInterfacePath`], detaching the kernel
//!   driver and claiming it
//! - Discovery of the interrupt IN/OUT endpoints
//! - Timed reads and writes with HID report-ID framing
//!
//! # Example
//!
//! ```no_run
//! use hid::HidDevice;
//!
//! hid::init()?;
//! let device = HidDevice::open_first(0x04d8, 0xfa87)?;
//!
//! let mut report = [0u8; 65];
//! report[1] = 0x01;
//! device.write(&report)?;
//!
//! let mut response = [0u8; 64];
//! let len = device.read(&mut response)?;
//! println!("{} bytes", len);
//!
//! device.close();
//! hid::shutdown();
//! # Ok::<(), hid::HidError>(())
//! ```

pub mod backend;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod handle;
pub mod mock;
pub mod path;

pub use backend::{init, is_initialized, shutdown};
pub use descriptor::{AltSetting, EndpointInfo, Endpoints};
pub use device::{DEFAULT_TIMEOUT, HidDevice, HidInterfaceList, Timeouts};
pub use error::{HidError, Result};
pub use handle::{NativeHandle, UsbHandle};
pub use path::HidInterfacePath;
