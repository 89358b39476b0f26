//! Native handle abstraction
//!
//! [`HidDevice`](crate::HidDevice) talks to the open device only through
//! [`UsbHandle`], so the same transport logic runs against libusb or against
//! the scripted handle in [`mock`](crate::mock).

use rusb::{Context, DeviceHandle, UsbContext};
use std::time::Duration;

/// libusb device handle used for real hardware
pub type NativeHandle = DeviceHandle<Context>;

/// Per-handle operations needed after an interface has been claimed
pub trait UsbHandle {
    /// Interrupt transfer from an IN endpoint; returns the byte count
    fn read_interrupt(&self, endpoint: u8, buf: &mut [u8], timeout: Duration)
    -> rusb::Result<usize>;

    /// Interrupt transfer to an OUT endpoint; returns the byte count
    fn write_interrupt(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize>;

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()>;

    fn attach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()>;
}

impl<T: UsbContext> UsbHandle for DeviceHandle<T> {
    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> rusb::Result<usize> {
        DeviceHandle::read_interrupt(self, endpoint, buf, timeout)
    }

    fn write_interrupt(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> rusb::Result<usize> {
        DeviceHandle::write_interrupt(self, endpoint, buf, timeout)
    }

    fn release_interface(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::release_interface(self, interface)
    }

    fn attach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::attach_kernel_driver(self, interface)
    }
}
