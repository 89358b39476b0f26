//! Text and JSON rendering of sensor readings

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use thermo::{EepromImage, HidInterfacePath, RawSensorData, ThermalFrame};

/// Bytes per line of the EEPROM dump
const EEPROM_BYTES_PER_LINE: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything the demo sequence reads
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub frame: ThermalFrame,
    pub raw: RawSensorData,
    pub eeprom: EepromImage,
}

pub fn json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

pub fn paths_text(paths: &[HidInterfacePath]) -> String {
    if paths.is_empty() {
        return "No thermal sensors found.".to_string();
    }

    let mut out = format!("Found {} sensor interface(s):\n", paths.len());
    for path in paths {
        out.push_str(&format!("  {}\n", path));
    }
    out
}

/// Four rows of sixteen temperatures, one decimal each
pub fn frame_text(frame: &ThermalFrame) -> String {
    frame
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|p| format!("{:.1}", p.temperature))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn raw_text(raw: &RawSensorData) -> String {
    let mut out = format!("PTAT: {}\nVcp: {}\nVir:\n", raw.ptat, raw.vcp);
    let rows: Vec<String> = raw
        .vir
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| format!("{:+05}", v))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    out.push_str(&rows.join("\n"));
    out
}

pub fn eeprom_text(eeprom: &EepromImage) -> String {
    eeprom
        .as_bytes()
        .chunks(EEPROM_BYTES_PER_LINE)
        .map(|line| {
            line.iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn snapshot_text(snapshot: &Snapshot) -> String {
    format!(
        "Frame:\n{}\n\nRaw data:\n{}\n\nEEPROM:\n{}",
        frame_text(&snapshot.frame),
        raw_text(&snapshot.raw),
        eeprom_text(&snapshot.eeprom)
    )
}
