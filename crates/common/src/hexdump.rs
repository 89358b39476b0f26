//! Hex dump formatting for raw reports

use std::fmt::Write;

/// Bytes per dump line
const LINE_WIDTH: usize = 16;

/// Format `data` as offset-prefixed hex lines, 16 bytes per line
///
/// ```
/// let dump = common::hex_dump(&[0x01, 0xab]);
/// assert_eq!(dump, "0000: 01 ab");
/// ```
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3 + data.len() / LINE_WIDTH * 7);

    for (line, chunk) in data.chunks(LINE_WIDTH).enumerate() {
        if line > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:04x}:", line * LINE_WIDTH);
        for byte in chunk {
            let _ = write!(out, " {:02x}", byte);
        }
    }

    out
}
