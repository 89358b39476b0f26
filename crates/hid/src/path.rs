//! Stable identifiers for HID interfaces

use crate::error::HidError;
use std::fmt;
use std::str::FromStr;

/// Identifies one HID interface on one USB device
///
/// Derived from bus number, device address and interface number, and
/// rendered as `BBBB:AAAA:II` in hex. The device address changes on replug,
/// so a path only stays valid while the device remains connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HidInterfacePath {
    bus: u8,
    address: u8,
    interface: u8,
}

impl HidInterfacePath {
    pub fn new(bus: u8, address: u8, interface: u8) -> Self {
        Self {
            bus,
            address,
            interface,
        }
    }

    pub fn bus_number(&self) -> u8 {
        self.bus
    }

    pub fn device_address(&self) -> u8 {
        self.address
    }

    pub fn interface_number(&self) -> u8 {
        self.interface
    }
}

impl fmt::Display for HidInterfacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:04x}:{:02x}",
            self.bus, self.address, self.interface
        )
    }
}

impl FromStr for HidInterfacePath {
    type Err = HidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HidError::InvalidPath(s.to_string());

        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }

        let field = |part: &str| u8::from_str_radix(part, 16).map_err(|_| invalid());

        Ok(Self::new(field(parts[0])?, field(parts[1])?, field(parts[2])?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let path = HidInterfacePath::new(3, 0x1a, 2);
        assert_eq!(path.to_string(), "0003:001a:02");
    }

    #[test]
    fn test_parse_display_output() {
        let path: HidInterfacePath = "0001:007f:00".parse().unwrap();
        assert_eq!(path.bus_number(), 1);
        assert_eq!(path.device_address(), 0x7f);
        assert_eq!(path.interface_number(), 0);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<HidInterfacePath>().is_err());
        assert!("0001:0002".parse::<HidInterfacePath>().is_err());
        assert!("0001::00".parse::<HidInterfacePath>().is_err());
        assert!("0001:0002:00:01".parse::<HidInterfacePath>().is_err());
        assert!("0001:zz02:00".parse::<HidInterfacePath>().is_err());
        // Bus numbers are one byte wide
        assert!("0100:0002:00".parse::<HidInterfacePath>().is_err());
    }
}
