//! Sensor handle
//!
//! [`UsbThermo`] wraps one open HID interface and runs the sensor's
//! command/response exchanges on it. Exchanges take `&mut self`, so only one
//! can be in flight per handle.

use crate::command::{ACK, Command, Half, PACKET_SIZE, Response};
use crate::decode::{decode_half_frame, decode_half_raw, signed16, unsigned16};
use crate::error::{Result, ThermoError};
use crate::types::{EEPROM_PAGE_SIZE, EepromImage, RawSensorData, RefreshRate, ThermalFrame};
use common::hex_dump;
use hid::{HidDevice, HidInterfaceList, HidInterfacePath, NativeHandle, UsbHandle};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// USB vendor ID of the OTK-THG01/02
pub const VENDOR_ID: u16 = 0x04d8;

/// USB product ID of the OTK-THG01/02
pub const PRODUCT_ID: u16 = 0xfa87;

/// Pause between reads while the sensor has nothing to send
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default upper bound on one command/response exchange
pub const DEFAULT_COMMAND_DEADLINE: Duration = Duration::from_secs(10);

/// Initialize the USB backend
pub fn init() -> Result<()> {
    hid::init()?;
    Ok(())
}

/// Shut down the USB backend
pub fn exit() {
    hid::shutdown();
}

/// An open thermal sensor
pub struct UsbThermo<H: UsbHandle = NativeHandle> {
    hid: HidDevice<H>,
    deadline: Option<Duration>,
}

impl UsbThermo<NativeHandle> {
    /// HID interfaces belonging to connected sensors
    pub fn list() -> Result<HidInterfaceList> {
        Self::list_matching(VENDOR_ID, PRODUCT_ID)
    }

    /// HID interfaces of devices with the given IDs (0 matches any)
    pub fn list_matching(vendor_id: u16, product_id: u16) -> Result<HidInterfaceList> {
        Ok(HidDevice::enumerate(vendor_id, product_id)?)
    }

    /// Open the first connected sensor
    pub fn open() -> Result<Self> {
        Self::open_matching(VENDOR_ID, PRODUCT_ID)
    }

    /// Open the first device with the given IDs
    pub fn open_matching(vendor_id: u16, product_id: u16) -> Result<Self> {
        let hid = HidDevice::open_first(vendor_id, product_id)?;
        info!(
            "Opened thermal sensor {:04x}:{:04x} on interface {}",
            vendor_id,
            product_id,
            hid.interface_number()
        );
        Ok(Self::new(hid))
    }

    /// Open the sensor at `path`
    pub fn open_path(path: &HidInterfacePath) -> Result<Self> {
        let hid = HidDevice::open_path(path)?;
        info!("Opened thermal sensor at {}", path);
        Ok(Self::new(hid))
    }
}

impl<H: UsbHandle> UsbThermo<H> {
    pub fn new(hid: HidDevice<H>) -> Self {
        Self {
            hid,
            deadline: Some(DEFAULT_COMMAND_DEADLINE),
        }
    }

    pub fn hid(&self) -> &HidDevice<H> {
        &self.hid
    }

    /// Set the read and write timeout of each transfer
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.hid.set_default_timeout(timeout);
    }

    pub fn command_deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Bound each exchange; `None` polls until the device answers or a
    /// transfer fails
    pub fn set_command_deadline(&mut self, deadline: Option<Duration>) {
        self.deadline = deadline;
    }

    /// Send four raw command bytes and wait for the response
    pub fn send_command(&mut self, cmd1: u8, cmd2: u8, cmd3: u8, cmd4: u8) -> Result<Response> {
        self.command(Command::Raw([cmd1, cmd2, cmd3, cmd4]))
    }

    /// Send a command and wait for the response
    ///
    /// Zero-length reads mean the sensor is not ready yet; they are retried
    /// every [`POLL_INTERVAL`] until data arrives, a read fails, or the
    /// command deadline passes.
    pub fn command(&mut self, command: Command) -> Result<Response> {
        let report = command.report();
        trace!("-> {}\n{}", command, hex_dump(&report[1..]));

        self.hid.write(&report)?;

        let started = Instant::now();
        let mut response = [0u8; PACKET_SIZE];

        loop {
            let len = self.hid.read(&mut response)?;
            if len > 0 {
                trace!("<- {} bytes\n{}", len, hex_dump(&response[..len]));
                return Ok(response);
            }

            if let Some(deadline) = self.deadline
                && started.elapsed() >= deadline
            {
                debug!("Gave up on {} after {:?}", command, started.elapsed());
                return Err(ThermoError::DeadlineExceeded { command, deadline });
            }

            trace!("Sensor not ready, retrying");
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Send a command whose response must start with the ack byte
    fn command_acked(&mut self, command: Command) -> Result<Response> {
        let response = self.command(command)?;
        if response[0] != ACK {
            return Err(ThermoError::Rejected {
                command,
                status: response[0],
            });
        }
        Ok(response)
    }

    /// Read one calibrated thermal image
    pub fn read_frame(&mut self) -> Result<ThermalFrame> {
        self.command_acked(Command::Status)?;

        let upper = self.command(Command::ReadFrame(Half::Upper))?;
        let lower = self.command(Command::ReadFrame(Half::Lower))?;

        let mut frame = ThermalFrame::default();
        for (half, response) in [(Half::Upper, &upper), (Half::Lower, &lower)] {
            let rows = decode_half_frame(response);
            let first = half.first_row();
            frame.pixels[first..first + rows.len()].copy_from_slice(&rows);
        }

        Ok(frame)
    }

    /// Set the emissivity used for temperature calibration
    ///
    /// Values outside `(0, 1]` are rejected without talking to the device.
    pub fn set_emissivity(&mut self, emissivity: f64) -> Result<()> {
        let value = encode_emissivity(emissivity)?;
        self.command_acked(Command::SetEmissivity(value))?;
        debug!("Emissivity set to {}", emissivity);
        Ok(())
    }

    pub fn set_refresh_rate(&mut self, rate: RefreshRate) -> Result<()> {
        self.command_acked(Command::SetRefreshRate(rate))?;
        debug!("Refresh rate set to {}", rate);
        Ok(())
    }

    /// Read uncalibrated PTAT, Vcp and thermopile values
    pub fn read_raw_data(&mut self) -> Result<RawSensorData> {
        let reference = self.command(Command::ReadReference)?;

        let mut raw = RawSensorData {
            ptat: unsigned16(&reference, 0),
            vcp: signed16(&reference, 2),
            ..RawSensorData::default()
        };

        for half in [Half::Upper, Half::Lower] {
            let response = self.command(Command::ReadThermopile(half))?;
            let rows = decode_half_raw(&response);
            let first = half.first_row();
            raw.vir[first..first + rows.len()].copy_from_slice(&rows);
        }

        Ok(raw)
    }

    /// Read the 256-byte calibration EEPROM, page by page
    pub fn read_eeprom(&mut self) -> Result<EepromImage> {
        let mut image = EepromImage::default();

        for (page, chunk) in image.0.chunks_exact_mut(EEPROM_PAGE_SIZE).enumerate() {
            let response = self.command(Command::ReadEepromPage(page as u8))?;
            chunk.copy_from_slice(&response[..EEPROM_PAGE_SIZE]);
        }

        Ok(image)
    }

    /// Release the interface and close the device
    pub fn close(self) {
        self.hid.close();
    }
}

/// Emissivity in thousandths, rounded
pub fn encode_emissivity(emissivity: f64) -> Result<u16> {
    if !(emissivity > 0.0 && emissivity <= 1.0) {
        return Err(ThermoError::InvalidEmissivity(emissivity));
    }
    Ok((emissivity * 1000.0).round() as u16)
}
