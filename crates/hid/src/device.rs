//! HID interface handle
//!
//! [`HidDevice`] owns one open device handle with one claimed HID interface
//! and the interrupt endpoints discovered on it. Closing (or dropping) the
//! handle releases the interface first and closes the device second.

use crate::backend;
use crate::descriptor::{
    AltSetting, CLASS_PER_INTERFACE, Endpoints, config_descriptor, hid_alt_settings,
    select_endpoints, summarize_config,
};
use crate::error::{HidError, Result};
use crate::handle::{NativeHandle, UsbHandle};
use crate::path::HidInterfacePath;
use rusb::{Context, Device, UsbContext};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default read and write timeout (5 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Paths produced by one enumeration pass, in backend order
pub type HidInterfaceList = Vec<HidInterfacePath>;

/// Per-handle transfer timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub read: Duration,
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            read: DEFAULT_TIMEOUT,
            write: DEFAULT_TIMEOUT,
        }
    }
}

/// An open, claimed HID interface
pub struct HidDevice<H: UsbHandle = NativeHandle> {
    handle: H,
    interface: u8,
    endpoints: Endpoints,
    timeouts: Timeouts,
    /// Kernel driver was detached by us and is re-attached on release
    kernel_driver_detached: bool,
    claimed: bool,
}

/// A zero filter matches any ID
pub(crate) fn matches_filter(filter: u16, id: u16) -> bool {
    filter == 0 || filter == id
}

impl HidDevice<NativeHandle> {
    /// List HID interfaces, optionally filtered by vendor and product ID
    ///
    /// Only devices whose class is defined per interface are considered.
    /// Each interface is reported once, for its first HID alt setting.
    pub fn enumerate(vendor_id: u16, product_id: u16) -> Result<HidInterfaceList> {
        let context = backend::context()?;
        let devices = context.devices()?;
        let mut paths = HidInterfaceList::new();

        for device in devices.iter() {
            let desc = match device.device_descriptor() {
                Ok(desc) => desc,
                Err(e) => {
                    debug!(
                        "Skipping bus {} addr {}: no device descriptor ({})",
                        device.bus_number(),
                        device.address(),
                        e
                    );
                    continue;
                }
            };

            if desc.class_code() != CLASS_PER_INTERFACE
                || !matches_filter(vendor_id, desc.vendor_id())
                || !matches_filter(product_id, desc.product_id())
            {
                continue;
            }

            let Some(config) = config_descriptor(&device) else {
                continue;
            };

            let interfaces = summarize_config(&config);
            for alt in hid_alt_settings(&interfaces) {
                let path = HidInterfacePath::new(
                    device.bus_number(),
                    device.address(),
                    alt.interface_number,
                );
                trace!(
                    "Found HID interface {} ({:04x}:{:04x})",
                    path,
                    desc.vendor_id(),
                    desc.product_id()
                );
                paths.push(path);
            }
        }

        debug!("Enumerated {} HID interface(s)", paths.len());
        Ok(paths)
    }

    /// Open the HID interface identified by `path`
    ///
    /// Descriptors are read again rather than taken from an earlier
    /// enumeration. Anything acquired before a failing step is released
    /// before the error is returned.
    pub fn open_path(path: &HidInterfacePath) -> Result<Self> {
        let context = backend::context()?;

        for device in context.devices()?.iter() {
            if device.bus_number() != path.bus_number()
                || device.address() != path.device_address()
            {
                continue;
            }

            let Some(config) = config_descriptor(&device) else {
                continue;
            };

            let interfaces = summarize_config(&config);
            let matched = hid_alt_settings(&interfaces).into_iter().find(|alt| {
                HidInterfacePath::new(device.bus_number(), device.address(), alt.interface_number)
                    == *path
            });

            if let Some(alt) = matched {
                return Self::claim(&device, *path, alt);
            }
        }

        Err(HidError::PathNotFound(*path))
    }

    /// Open the first HID interface matching the filter
    pub fn open_first(vendor_id: u16, product_id: u16) -> Result<Self> {
        let paths = Self::enumerate(vendor_id, product_id)?;
        let path = paths.first().ok_or(HidError::NoDevice {
            vendor_id,
            product_id,
        })?;

        Self::open_path(path)
    }

    /// Open the device, take the interface from the kernel and claim it
    fn claim(device: &Device<Context>, path: HidInterfacePath, alt: &AltSetting) -> Result<Self> {
        let interface = alt.interface_number;

        let handle = device.open().map_err(|source| {
            warn!("Failed to open {}: {}", path, source);
            HidError::Open { path, source }
        })?;
        debug!("Opened {}", path);

        let detached = match handle.kernel_driver_active(interface) {
            Ok(true) => {
                handle
                    .detach_kernel_driver(interface)
                    .map_err(|source| {
                        warn!(
                            "Failed to detach kernel driver from interface {}: {}",
                            interface, source
                        );
                        HidError::DetachKernelDriver { interface, source }
                    })?;
                debug!("Detached kernel driver from interface {}", interface);
                true
            }
            Ok(false) => false,
            Err(e) => {
                debug!(
                    "Could not check kernel driver status for interface {}: {}",
                    interface, e
                );
                false
            }
        };

        if let Err(source) = handle.claim_interface(interface) {
            warn!("Failed to claim interface {}: {}", interface, source);
            if detached && let Err(e) = handle.attach_kernel_driver(interface) {
                debug!(
                    "Could not reattach kernel driver to interface {}: {}",
                    interface, e
                );
            }
            return Err(HidError::ClaimInterface { interface, source });
        }

        let endpoints = select_endpoints(&alt.endpoints);
        debug!(
            "Claimed interface {} on {} (in={:?}, out={:?}, max packet {})",
            interface, path, endpoints.input, endpoints.output, endpoints.input_max_packet_size
        );

        Ok(Self::from_handle(handle, interface, endpoints, detached))
    }
}

impl<H: UsbHandle> HidDevice<H> {
    /// Wrap a handle whose `interface` is already claimed
    pub fn from_handle(
        handle: H,
        interface: u8,
        endpoints: Endpoints,
        kernel_driver_detached: bool,
    ) -> Self {
        Self {
            handle,
            interface,
            endpoints,
            timeouts: Timeouts::default(),
            kernel_driver_detached,
            claimed: true,
        }
    }

    pub fn interface_number(&self) -> u8 {
        self.interface
    }

    pub fn endpoints(&self) -> Endpoints {
        self.endpoints
    }

    pub fn input_max_packet_size(&self) -> u16 {
        self.endpoints.input_max_packet_size
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Set both the read and the write timeout
    pub fn set_default_timeout(&mut self, timeout: Duration) {
        self.timeouts = Timeouts {
            read: timeout,
            write: timeout,
        };
    }

    pub fn set_timeouts(&mut self, timeouts: Timeouts) {
        self.timeouts = timeouts;
    }

    /// Write one report using the default write timeout
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        self.write_timeout(data, self.timeouts.write)
    }

    /// Write one report to the interrupt OUT endpoint
    ///
    /// `data[0]` is the report ID. A zero report ID is not sent on the wire,
    /// but it is still counted in the returned length.
    pub fn write_timeout(&self, data: &[u8], timeout: Duration) -> Result<usize> {
        let (&report_id, payload) = data.split_first().ok_or(HidError::EmptyReport)?;
        let endpoint = self.endpoints.output.ok_or(HidError::NoOutputEndpoint)?;

        let wire = if report_id == 0 { payload } else { data };

        let transferred = self
            .handle
            .write_interrupt(endpoint, wire, timeout)
            .map_err(|source| HidError::Transfer { endpoint, source })?;

        trace!(
            "Wrote {} of {} bytes to endpoint {:#04x}",
            transferred,
            wire.len(),
            endpoint
        );

        Ok(if report_id == 0 {
            transferred + 1
        } else {
            transferred
        })
    }

    /// Read one report using the default read timeout
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.read_timeout(buf, self.timeouts.read)
    }

    /// Read one report from the interrupt IN endpoint
    ///
    /// A return of `Ok(0)` means the device sent nothing; it is not an error.
    pub fn read_timeout(&self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let endpoint = self.endpoints.input.ok_or(HidError::NoInputEndpoint)?;

        let transferred = self
            .handle
            .read_interrupt(endpoint, buf, timeout)
            .map_err(|source| HidError::Transfer { endpoint, source })?;

        trace!("Read {} bytes from endpoint {:#04x}", transferred, endpoint);
        Ok(transferred)
    }

    /// Release the interface and close the device
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.claimed {
            return;
        }
        self.claimed = false;

        if let Err(e) = self.handle.release_interface(self.interface) {
            warn!("Failed to release interface {}: {}", self.interface, e);
        }

        if self.kernel_driver_detached {
            match self.handle.attach_kernel_driver(self.interface) {
                Ok(()) => debug!("Reattached kernel driver to interface {}", self.interface),
                Err(e) => debug!(
                    "Could not reattach kernel driver to interface {}: {}",
                    self.interface, e
                ),
            }
        }

        debug!("Released interface {}", self.interface);
    }
}

impl<H: UsbHandle> Drop for HidDevice<H> {
    fn drop(&mut self) {
        self.release();
    }
}
