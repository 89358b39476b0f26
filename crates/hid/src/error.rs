//! Transport error types

use crate::path::HidInterfacePath;
use thiserror::Error;

/// HID transport errors
#[derive(Debug, Error)]
pub enum HidError {
    /// `hid::init()` has not been called, or `hid::shutdown()` already ran
    #[error("USB backend not initialized")]
    NotInitialized,

    /// Backend failure outside of a specific open step or transfer
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    /// Path string could not be parsed
    #[error("Invalid HID interface path '{0}', expected BBBB:AAAA:II")]
    InvalidPath(String),

    /// No HID interface with this path exists
    #[error("HID interface {0} not found")]
    PathNotFound(HidInterfacePath),

    /// Enumeration produced no interface for the filter
    #[error("No HID interface found for {vendor_id:04x}:{product_id:04x}")]
    NoDevice { vendor_id: u16, product_id: u16 },

    #[error("Failed to open {path}: {source}")]
    Open {
        path: HidInterfacePath,
        source: rusb::Error,
    },

    #[error("Failed to detach kernel driver from interface {interface}: {source}")]
    DetachKernelDriver { interface: u8, source: rusb::Error },

    #[error("Failed to claim interface {interface}: {source}")]
    ClaimInterface { interface: u8, source: rusb::Error },

    #[error("Interface has no interrupt IN endpoint")]
    NoInputEndpoint,

    #[error("Interface has no interrupt OUT endpoint")]
    NoOutputEndpoint,

    /// A write needs at least the report-ID byte
    #[error("Report is empty")]
    EmptyReport,

    /// Interrupt transfer failed (includes timeouts)
    #[error("Interrupt transfer on endpoint {endpoint:#04x} failed: {source}")]
    Transfer { endpoint: u8, source: rusb::Error },
}

impl HidError {
    /// True if the failure was a transfer timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            HidError::Transfer {
                source: rusb::Error::Timeout,
                ..
            } | HidError::Usb(rusb::Error::Timeout)
        )
    }
}

/// Type alias for transport results
pub type Result<T> = std::result::Result<T, HidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_display() {
        let err = HidError::Transfer {
            endpoint: 0x81,
            source: rusb::Error::Pipe,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("0x81"));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_timeout_detection() {
        let err = HidError::Transfer {
            endpoint: 0x01,
            source: rusb::Error::Timeout,
        };
        assert!(err.is_timeout());
        assert!(HidError::Usb(rusb::Error::Timeout).is_timeout());
        assert!(!HidError::NotInitialized.is_timeout());
    }

    #[test]
    fn test_path_not_found_display() {
        let err = HidError::PathNotFound(HidInterfacePath::new(1, 5, 0));
        assert_eq!(format!("{}", err), "HID interface 0001:0005:00 not found");
    }
}
