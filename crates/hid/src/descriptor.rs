//! Descriptor summaries
//!
//! Interface and endpoint descriptors are copied out of libusb into plain
//! values so that HID interface and endpoint selection do not depend on a
//! live device.

use rusb::{ConfigDescriptor, Device, Direction, TransferType, UsbContext};
use tracing::debug;

/// bDeviceClass value meaning "class is defined per interface"
pub const CLASS_PER_INTERFACE: u8 = 0x00;

/// bInterfaceClass value for HID
pub const CLASS_HID: u8 = 0x03;

/// One endpoint descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    pub address: u8,
    pub direction: Direction,
    pub transfer_type: TransferType,
    pub max_packet_size: u16,
}

impl EndpointInfo {
    fn is_interrupt(&self) -> bool {
        self.transfer_type == TransferType::Interrupt
    }
}

impl From<rusb::EndpointDescriptor<'_>> for EndpointInfo {
    fn from(ep: rusb::EndpointDescriptor<'_>) -> Self {
        Self {
            address: ep.address(),
            direction: ep.direction(),
            transfer_type: ep.transfer_type(),
            max_packet_size: ep.max_packet_size(),
        }
    }
}

/// One alternate setting of an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltSetting {
    pub interface_number: u8,
    pub setting_number: u8,
    pub class_code: u8,
    pub endpoints: Vec<EndpointInfo>,
}

impl AltSetting {
    pub fn is_hid(&self) -> bool {
        self.class_code == CLASS_HID
    }
}

impl From<rusb::InterfaceDescriptor<'_>> for AltSetting {
    fn from(desc: rusb::InterfaceDescriptor<'_>) -> Self {
        Self {
            interface_number: desc.interface_number(),
            setting_number: desc.setting_number(),
            class_code: desc.class_code(),
            endpoints: desc.endpoint_descriptors().map(EndpointInfo::from).collect(),
        }
    }
}

/// Interrupt endpoints selected for a HID interface
///
/// The input endpoint is needed for reads; the output endpoint is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub input: Option<u8>,
    pub output: Option<u8>,
    pub input_max_packet_size: u16,
}

/// Pick the first interrupt IN and the first interrupt OUT endpoint
pub fn select_endpoints(endpoints: &[EndpointInfo]) -> Endpoints {
    let mut selected = Endpoints::default();

    for ep in endpoints.iter().filter(|ep| ep.is_interrupt()) {
        match ep.direction {
            Direction::In if selected.input.is_none() => {
                selected.input = Some(ep.address);
                selected.input_max_packet_size = ep.max_packet_size;
            }
            Direction::Out if selected.output.is_none() => {
                selected.output = Some(ep.address);
            }
            _ => {}
        }
    }

    selected
}

/// Summarise a configuration as a list of interfaces, each a list of alt settings
pub fn summarize_config(config: &ConfigDescriptor) -> Vec<Vec<AltSetting>> {
    config
        .interfaces()
        .map(|interface| interface.descriptors().map(AltSetting::from).collect())
        .collect()
}

/// The first HID alt setting of every interface
///
/// Interfaces without a HID alt setting are skipped; later HID alt settings
/// of the same interface are not reported again.
pub fn hid_alt_settings(interfaces: &[Vec<AltSetting>]) -> Vec<&AltSetting> {
    interfaces
        .iter()
        .filter_map(|alts| alts.iter().find(|alt| alt.is_hid()))
        .collect()
}

/// Read the active configuration, falling back to configuration index 0
pub fn config_descriptor<T: UsbContext>(device: &Device<T>) -> Option<ConfigDescriptor> {
    match device.active_config_descriptor() {
        Ok(config) => Some(config),
        Err(e) => {
            debug!(
                "No active config on bus {} addr {} ({}), trying config 0",
                device.bus_number(),
                device.address(),
                e
            );
            device.config_descriptor(0).ok()
        }
    }
}
