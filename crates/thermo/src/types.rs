//! Sensor data types

use crate::error::ThermoError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Pixels per row
pub const WIDTH: usize = 16;

/// Rows per frame
pub const HEIGHT: usize = 4;

/// EEPROM size in bytes
pub const EEPROM_SIZE: usize = 256;

/// Bytes returned per EEPROM page read
pub const EEPROM_PAGE_SIZE: usize = 64;

/// Pages making up the EEPROM
pub const EEPROM_PAGES: usize = EEPROM_SIZE / EEPROM_PAGE_SIZE;

/// Measurement status of one pixel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelStatus {
    #[default]
    Normal,
    /// Below the measurable range; temperature is pinned to -50.0
    Underflow,
    /// Above the measurable range; temperature is pinned to 300.0
    Overflow,
}

/// One pixel of a thermal image
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Pixel {
    pub status: PixelStatus,
    /// Degrees Celsius
    pub temperature: f64,
}

/// Calibrated 16x4 thermal image
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ThermalFrame {
    pub pixels: [[Pixel; WIDTH]; HEIGHT],
}

impl ThermalFrame {
    pub fn width(&self) -> usize {
        WIDTH
    }

    pub fn height(&self) -> usize {
        HEIGHT
    }

    /// Pixel at column `x`, row `y`
    pub fn pixel(&self, x: usize, y: usize) -> Option<&Pixel> {
        self.pixels.get(y).and_then(|row| row.get(x))
    }

    pub fn rows(&self) -> &[[Pixel; WIDTH]; HEIGHT] {
        &self.pixels
    }

    /// Warmest pixel with a normal status
    pub fn max_temperature(&self) -> Option<f64> {
        self.normal_temperatures().reduce(f64::max)
    }

    /// Coldest pixel with a normal status
    pub fn min_temperature(&self) -> Option<f64> {
        self.normal_temperatures().reduce(f64::min)
    }

    fn normal_temperatures(&self) -> impl Iterator<Item = f64> + '_ {
        self.pixels
            .iter()
            .flatten()
            .filter(|p| p.status == PixelStatus::Normal)
            .map(|p| p.temperature)
    }
}

/// Uncalibrated sensor readout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RawSensorData {
    /// Proportional-to-absolute-temperature reference
    pub ptat: u16,
    /// Compensation pixel voltage
    pub vcp: i16,
    /// Thermopile voltages, row-major
    pub vir: [[i16; WIDTH]; HEIGHT],
}

/// Calibration EEPROM contents, pages in order
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EepromImage(pub [u8; EEPROM_SIZE]);

impl EepromImage {
    pub fn as_bytes(&self) -> &[u8; EEPROM_SIZE] {
        &self.0
    }

    /// One 64-byte page, or `None` past the last page
    pub fn page(&self, page: usize) -> Option<&[u8]> {
        let start = page.checked_mul(EEPROM_PAGE_SIZE)?;
        let end = start.checked_add(EEPROM_PAGE_SIZE)?;
        self.0.get(start..end)
    }

    pub fn len(&self) -> usize {
        EEPROM_SIZE
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for EepromImage {
    fn default() -> Self {
        Self([0; EEPROM_SIZE])
    }
}

impl fmt::Debug for EepromImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EepromImage(")?;
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

impl Serialize for EepromImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

/// Frame refresh rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshRate {
    Hz0_5,
    Hz1,
    Hz2,
    Hz4,
    Hz8,
    Hz16,
    Hz32,
}

impl RefreshRate {
    pub const ALL: [RefreshRate; 7] = [
        RefreshRate::Hz0_5,
        RefreshRate::Hz1,
        RefreshRate::Hz2,
        RefreshRate::Hz4,
        RefreshRate::Hz8,
        RefreshRate::Hz16,
        RefreshRate::Hz32,
    ];

    /// Byte sent in the set-refresh-rate command
    pub fn code(self) -> u8 {
        match self {
            RefreshRate::Hz0_5 => 0,
            RefreshRate::Hz1 => 1,
            RefreshRate::Hz2 => 2,
            RefreshRate::Hz4 => 4,
            RefreshRate::Hz8 => 8,
            RefreshRate::Hz16 => 16,
            RefreshRate::Hz32 => 32,
        }
    }

    pub fn hz(self) -> f64 {
        match self {
            RefreshRate::Hz0_5 => 0.5,
            other => f64::from(other.code()),
        }
    }

    pub fn from_hz(hz: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.hz() == hz)
    }
}

impl fmt::Display for RefreshRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz", self.hz())
    }
}

impl FromStr for RefreshRate {
    type Err = ThermoError;

    /// Accepts "0.5", "2", "16Hz", "32 hz"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed
            .strip_suffix("Hz")
            .or_else(|| trimmed.strip_suffix("hz"))
            .unwrap_or(trimmed)
            .trim();

        number
            .parse::<f64>()
            .ok()
            .and_then(Self::from_hz)
            .ok_or_else(|| ThermoError::UnsupportedRefreshRate(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_rate_codes() {
        let codes: Vec<u8> = RefreshRate::ALL.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 4, 8, 16, 32]);
    }

    #[test]
    fn test_refresh_rate_from_hz() {
        assert_eq!(RefreshRate::from_hz(0.5), Some(RefreshRate::Hz0_5));
        assert_eq!(RefreshRate::from_hz(8.0), Some(RefreshRate::Hz8));
        assert_eq!(RefreshRate::from_hz(0.0), None);
        assert_eq!(RefreshRate::from_hz(3.0), None);
    }

    #[test]
    fn test_refresh_rate_parse() {
        assert_eq!("0.5".parse::<RefreshRate>().unwrap(), RefreshRate::Hz0_5);
        assert_eq!("16Hz".parse::<RefreshRate>().unwrap(), RefreshRate::Hz16);
        assert_eq!(" 32 hz ".parse::<RefreshRate>().unwrap(), RefreshRate::Hz32);
        assert!("5".parse::<RefreshRate>().is_err());
        assert!("fast".parse::<RefreshRate>().is_err());
    }

    #[test]
    fn test_refresh_rate_display() {
        assert_eq!(RefreshRate::Hz0_5.to_string(), "0.5Hz");
        assert_eq!(RefreshRate::Hz4.to_string(), "4Hz");
    }

    #[test]
    fn test_eeprom_pages() {
        let mut image = EepromImage::default();
        image.0[64] = 0xaa;
        image.0[255] = 0xbb;

        assert_eq!(image.page(1).unwrap()[0], 0xaa);
        assert_eq!(image.page(3).unwrap()[63], 0xbb);
        assert!(image.page(4).is_none());
        assert_eq!(image.len(), 256);
    }

    #[test]
    fn test_frame_json_shape() {
        let mut frame = ThermalFrame::default();
        frame.pixels[3][15] = Pixel {
            status: PixelStatus::Overflow,
            temperature: 300.0,
        };

        let value = serde_json::to_value(frame).unwrap();
        let rows = value["pixels"].as_array().unwrap();

        assert_eq!(rows.len(), HEIGHT);
        assert_eq!(rows[0].as_array().unwrap().len(), WIDTH);
        assert_eq!(rows[0][0]["status"], "normal");
        assert_eq!(rows[3][15]["status"], "overflow");
        assert_eq!(rows[3][15]["temperature"], 300.0);
    }

    #[test]
    fn test_eeprom_json_is_byte_array() {
        let mut image = EepromImage::default();
        image.0[0] = 0xab;

        let value = serde_json::to_value(image).unwrap();
        let bytes = value.as_array().unwrap();

        assert_eq!(bytes.len(), EEPROM_SIZE);
        assert_eq!(bytes[0], 0xab);
        assert_eq!(bytes[255], 0);
    }

    #[test]
    fn test_raw_data_json_shape() {
        let mut raw = RawSensorData {
            ptat: 50000,
            vcp: -12,
            ..RawSensorData::default()
        };
        raw.vir[1][2] = -300;

        let value = serde_json::to_value(raw).unwrap();

        assert_eq!(value["ptat"], 50000);
        assert_eq!(value["vcp"], -12);
        assert_eq!(value["vir"][1][2], -300);
    }

    #[test]
    fn test_frame_extremes_ignore_flagged_pixels() {
        let mut frame = ThermalFrame::default();
        frame.pixels[0][0] = Pixel {
            status: PixelStatus::Overflow,
            temperature: 300.0,
        };
        frame.pixels[1][3].temperature = 36.5;
        frame.pixels[2][7].temperature = -4.0;

        assert_eq!(frame.max_temperature(), Some(36.5));
        assert_eq!(frame.min_temperature(), Some(-4.0));
        assert_eq!(frame.pixel(3, 1).unwrap().temperature, 36.5);
        assert!(frame.pixel(16, 0).is_none());
    }
}
