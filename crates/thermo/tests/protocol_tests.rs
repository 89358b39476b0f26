//! Integration tests for the sensor command set
//!
//! Drives `UsbThermo` over a scripted HID handle and checks:
//! - command framing on the wire
//! - the retry-on-empty poll and its deadline
//! - frame, raw data and EEPROM decoding
//! - failure propagation

use hid::mock::{ReadStep, ScriptedHandle};
use std::time::Duration;
use thermo::{Command, EEPROM_SIZE, PixelStatus, RefreshRate, ThermoError, UsbThermo};

fn sensor() -> (ScriptedHandle, UsbThermo<ScriptedHandle>) {
    let handle = ScriptedHandle::new();
    let sensor = UsbThermo::new(handle.clone().into_device());
    (handle, sensor)
}

/// 64-byte response built from 32 little-endian words
fn words_response(words: &[i16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn ack() -> Vec<u8> {
    let mut response = vec![0u8; 64];
    response[0] = 1;
    response
}

/// Command bytes of every write, report ID already stripped
fn sent_commands(handle: &ScriptedHandle) -> Vec<[u8; 4]> {
    handle
        .writes()
        .iter()
        .map(|w| [w.data[0], w.data[1], w.data[2], w.data[3]])
        .collect()
}

mod command {
    use super::*;

    #[test]
    fn test_frame_on_the_wire() {
        let (handle, mut sensor) = sensor();
        handle.push_read(vec![0xaa; 64]);

        let response = sensor.send_command(0x12, 0x34, 0x56, 0x78).unwrap();
        assert_eq!(response, [0xaa; 64]);

        let writes = handle.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].data.len(), 64);
        assert_eq!(&writes[0].data[..4], &[0x12, 0x34, 0x56, 0x78]);
        assert!(writes[0].data[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_reads_are_retried() {
        let (handle, mut sensor) = sensor();
        handle.push_empty_read();
        handle.push_empty_read();
        handle.push_read(vec![7; 64]);

        let response = sensor.command(Command::Status).unwrap();
        assert_eq!(response[0], 7);
        assert_eq!(handle.read_count(), 3);
        assert_eq!(handle.writes().len(), 1);
    }

    #[test]
    fn test_short_response_is_zero_padded() {
        let (handle, mut sensor) = sensor();
        handle.push_read(vec![1, 2, 3]);

        let response = sensor.command(Command::Status).unwrap();
        assert_eq!(&response[..3], &[1, 2, 3]);
        assert!(response[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_failure_skips_read() {
        let (handle, mut sensor) = sensor();
        handle.fail_write(0, rusb::Error::Io);
        handle.push_read(ack());

        let err = sensor.command(Command::Status).unwrap_err();
        assert!(matches!(err, ThermoError::Hid(_)));
        assert_eq!(handle.read_count(), 0);
    }

    #[test]
    fn test_read_failure_is_returned() {
        let (handle, mut sensor) = sensor();
        handle.push_read_error(rusb::Error::NoDevice);

        let err = sensor.command(Command::Status).unwrap_err();
        assert!(matches!(err, ThermoError::Hid(_)));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_deadline_bounds_empty_polling() {
        let (handle, mut sensor) = sensor();
        handle.set_idle_read(ReadStep::Empty);
        sensor.set_command_deadline(Some(Duration::from_millis(50)));

        let err = sensor.command(Command::Status).unwrap_err();
        assert!(matches!(
            err,
            ThermoError::DeadlineExceeded {
                command: Command::Status,
                ..
            }
        ));
        assert!(handle.read_count() >= 2);
    }

    #[test]
    fn test_default_deadline() {
        let (_handle, mut sensor) = sensor();
        assert_eq!(sensor.command_deadline(), Some(Duration::from_secs(10)));

        sensor.set_command_deadline(None);
        assert_eq!(sensor.command_deadline(), None);
    }

    #[test]
    fn test_set_timeout_applies_to_transfers() {
        let (handle, mut sensor) = sensor();
        sensor.set_timeout(Duration::from_millis(100));
        handle.push_read(ack());

        sensor.command(Command::Status).unwrap();
        assert_eq!(handle.writes()[0].timeout, Duration::from_millis(100));
        assert_eq!(sensor.hid().timeouts().read, Duration::from_millis(100));
    }
}

mod frame {
    use super::*;

    #[test]
    fn test_read_frame_end_to_end() {
        let (handle, mut sensor) = sensor();
        handle.push_read(ack());
        handle.push_read(words_response(&[100; 32]));
        handle.push_read(words_response(&[-9990; 32]));

        let frame = sensor.read_frame().unwrap();

        assert_eq!(frame.width(), 16);
        assert_eq!(frame.height(), 4);
        for (y, row) in frame.rows().iter().enumerate() {
            for pixel in row {
                if y < 2 {
                    assert_eq!(pixel.status, PixelStatus::Normal);
                    assert_eq!(pixel.temperature, 10.0);
                } else {
                    assert_eq!(pixel.status, PixelStatus::Overflow);
                    assert_eq!(pixel.temperature, 300.0);
                }
            }
        }

        assert_eq!(
            sent_commands(&handle),
            vec![[0, 0, 0, 0], [1, 0, 0, 0], [1, 1, 0, 0]]
        );
    }

    #[test]
    fn test_read_frame_pixel_order() {
        let (handle, mut sensor) = sensor();
        let upper: Vec<i16> = (0..32).collect();
        let lower: Vec<i16> = (32..64).collect();
        handle.push_read(ack());
        handle.push_read(words_response(&upper));
        handle.push_read(words_response(&lower));

        let frame = sensor.read_frame().unwrap();

        assert_eq!(frame.pixel(0, 0).unwrap().temperature, 0.0);
        assert_eq!(frame.pixel(15, 0).unwrap().temperature, 1.5);
        assert_eq!(frame.pixel(0, 1).unwrap().temperature, 1.6);
        assert_eq!(frame.pixel(0, 2).unwrap().temperature, 3.2);
        assert_eq!(frame.pixel(15, 3).unwrap().temperature, 6.3);
    }

    #[test]
    fn test_not_ready_status_stops_after_one_command() {
        let (handle, mut sensor) = sensor();
        handle.push_read(vec![0; 64]);
        handle.push_read(words_response(&[100; 32]));
        handle.push_read(words_response(&[100; 32]));

        let err = sensor.read_frame().unwrap_err();

        assert!(matches!(
            err,
            ThermoError::Rejected {
                command: Command::Status,
                status: 0
            }
        ));
        assert_eq!(handle.writes().len(), 1);
        assert_eq!(handle.pending_reads(), 2);
    }

    #[test]
    fn test_second_half_failure_fails_frame() {
        let (handle, mut sensor) = sensor();
        handle.push_read(ack());
        handle.push_read(words_response(&[100; 32]));
        handle.push_read_error(rusb::Error::Pipe);

        assert!(sensor.read_frame().is_err());
        assert_eq!(handle.writes().len(), 3);
    }
}

mod configuration {
    use super::*;

    #[test]
    fn test_set_emissivity_encoding() {
        let (handle, mut sensor) = sensor();
        handle.push_read(ack());

        sensor.set_emissivity(0.95).unwrap();

        assert_eq!(sent_commands(&handle), vec![[0x04, 0xb6, 0x03, 0x00]]);
    }

    #[test]
    fn test_set_emissivity_rejects_without_io() {
        let (handle, mut sensor) = sensor();

        for value in [0.0, -0.1, 1.5] {
            let err = sensor.set_emissivity(value).unwrap_err();
            assert!(matches!(err, ThermoError::InvalidEmissivity(_)));
        }

        assert!(handle.writes().is_empty());
        assert_eq!(handle.read_count(), 0);
    }

    #[test]
    fn test_set_emissivity_requires_ack() {
        let (handle, mut sensor) = sensor();
        handle.push_read(vec![0; 64]);

        assert!(matches!(
            sensor.set_emissivity(0.5),
            Err(ThermoError::Rejected { status: 0, .. })
        ));
    }

    #[test]
    fn test_set_refresh_rate() {
        let (handle, mut sensor) = sensor();
        handle.push_read(ack());
        handle.push_read(ack());

        sensor.set_refresh_rate(RefreshRate::Hz2).unwrap();
        sensor.set_refresh_rate(RefreshRate::Hz0_5).unwrap();

        assert_eq!(
            sent_commands(&handle),
            vec![[0x03, 2, 0, 0], [0x03, 0, 0, 0]]
        );
    }

    #[test]
    fn test_set_refresh_rate_requires_ack() {
        let (handle, mut sensor) = sensor();
        handle.push_read(vec![2; 64]);

        assert!(matches!(
            sensor.set_refresh_rate(RefreshRate::Hz32),
            Err(ThermoError::Rejected { status: 2, .. })
        ));
    }
}

mod raw_data {
    use super::*;

    #[test]
    fn test_read_raw_data() {
        let (handle, mut sensor) = sensor();

        let mut reference = vec![0u8; 64];
        reference[0..2].copy_from_slice(&0xc350u16.to_le_bytes());
        reference[2..4].copy_from_slice(&(-1234i16).to_le_bytes());
        handle.push_read(reference);

        let upper: Vec<i16> = (0..32).map(|i| i * 10).collect();
        let lower: Vec<i16> = (0..32).map(|i| -i).collect();
        handle.push_read(words_response(&upper));
        handle.push_read(words_response(&lower));

        let raw = sensor.read_raw_data().unwrap();

        assert_eq!(raw.ptat, 50000);
        assert_eq!(raw.vcp, -1234);
        assert_eq!(raw.vir[0][1], 10);
        assert_eq!(raw.vir[1][15], 310);
        assert_eq!(raw.vir[2][0], 0);
        assert_eq!(raw.vir[3][15], -31);

        assert_eq!(
            sent_commands(&handle),
            vec![[0x82, 0, 0, 0], [0x81, 0, 0, 0], [0x81, 1, 0, 0]]
        );
    }

    #[test]
    fn test_read_raw_data_failure() {
        let (handle, mut sensor) = sensor();
        handle.push_read(vec![0; 64]);
        handle.push_read_error(rusb::Error::Timeout);

        let err = sensor.read_raw_data().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(handle.writes().len(), 2);
    }
}

mod eeprom {
    use super::*;

    #[test]
    fn test_pages_in_order() {
        let (handle, mut sensor) = sensor();
        for page in 0..4u8 {
            handle.push_read(vec![page + 0x10; 64]);
        }

        let image = sensor.read_eeprom().unwrap();

        assert_eq!(image.as_bytes().len(), EEPROM_SIZE);
        for page in 0..4usize {
            assert!(image.page(page).unwrap().iter().all(|&b| b == page as u8 + 0x10));
        }
        assert_eq!(
            sent_commands(&handle),
            vec![
                [0x80, 0, 0, 0],
                [0x80, 1, 0, 0],
                [0x80, 2, 0, 0],
                [0x80, 3, 0, 0]
            ]
        );
    }

    #[test]
    fn test_page_failure_aborts() {
        let (handle, mut sensor) = sensor();
        handle.push_read(vec![0x10; 64]);
        handle.push_read(vec![0x11; 64]);
        handle.fail_write(2, rusb::Error::Pipe);
        handle.push_read(vec![0x13; 64]);

        assert!(sensor.read_eeprom().is_err());
        assert_eq!(sent_commands(&handle), vec![[0x80, 0, 0, 0], [0x80, 1, 0, 0]]);
        assert_eq!(handle.pending_reads(), 1);
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn test_close_releases_interface() {
        let (handle, sensor) = sensor();
        sensor.close();
        assert_eq!(handle.released_interfaces(), vec![0]);
    }
}
