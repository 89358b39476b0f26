//! Response decoding
//!
//! All multi-byte fields are little-endian 16-bit values. Pixel and
//! thermopile halves carry 32 values, 16 per row, row-major.

use crate::command::{PACKET_SIZE, Response};
use crate::types::{Pixel, PixelStatus, WIDTH};
use byteorder::{ByteOrder, LittleEndian};

/// Raw pixel values the sensor uses to flag underflow
pub const UNDERFLOW_MARKERS: [i16; 2] = [-9991, -9992];

/// Raw pixel value the sensor uses to flag overflow
pub const OVERFLOW_MARKER: i16 = -9990;

pub const UNDERFLOW_TEMPERATURE: f64 = -50.0;
pub const OVERFLOW_TEMPERATURE: f64 = 300.0;

/// Rows carried by one half transfer
const HALF_ROWS: usize = 2;

const _: () = assert!(HALF_ROWS * WIDTH * 2 == PACKET_SIZE);

/// Unsigned 16-bit field at `index`
///
/// # Panics
///
/// If `data` is shorter than `index + 2`.
pub fn unsigned16(data: &[u8], index: usize) -> u16 {
    LittleEndian::read_u16(&data[index..index + 2])
}

/// Two's-complement 16-bit field at `index`
///
/// # Panics
///
/// If `data` is shorter than `index + 2`.
pub fn signed16(data: &[u8], index: usize) -> i16 {
    LittleEndian::read_i16(&data[index..index + 2])
}

/// Decode one raw pixel value in tenths of a degree
pub fn decode_pixel(raw: i16) -> Pixel {
    if UNDERFLOW_MARKERS.contains(&raw) {
        Pixel {
            status: PixelStatus::Underflow,
            temperature: UNDERFLOW_TEMPERATURE,
        }
    } else if raw == OVERFLOW_MARKER {
        Pixel {
            status: PixelStatus::Overflow,
            temperature: OVERFLOW_TEMPERATURE,
        }
    } else {
        Pixel {
            status: PixelStatus::Normal,
            temperature: f64::from(raw) / 10.0,
        }
    }
}

/// Two rows of raw 16-bit values
pub fn decode_half_raw(response: &Response) -> [[i16; WIDTH]; HALF_ROWS] {
    let mut rows = [[0i16; WIDTH]; HALF_ROWS];
    let mut values = response.chunks_exact(2).map(LittleEndian::read_i16);

    for row in rows.iter_mut() {
        for (value, raw) in row.iter_mut().zip(values.by_ref()) {
            *value = raw;
        }
    }

    rows
}

/// Two rows of calibrated pixels
pub fn decode_half_frame(response: &Response) -> [[Pixel; WIDTH]; HALF_ROWS] {
    decode_half_raw(response).map(|row| row.map(decode_pixel))
}
