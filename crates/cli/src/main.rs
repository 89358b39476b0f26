//! usbthermo
//!
//! Command-line reader for the OTK-THG01/02 USB thermal imaging sensor.
//! Lists sensors, reads thermal frames, raw sensor data and the
//! calibration EEPROM.

mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::setup_logging;
use config::ThermoConfig;
use output::{OutputFormat, Snapshot};
use std::path::PathBuf;
use thermo::{HidInterfacePath, RefreshRate, UsbThermo};
use tracing::{debug, info};

/// Emissivity applied by the demo sequence when none is configured
const DEMO_EMISSIVITY: f64 = 0.95;

/// Refresh rate applied by the demo sequence when none is configured
const DEMO_REFRESH_RATE: RefreshRate = RefreshRate::Hz2;

#[derive(Parser, Debug)]
#[command(name = "usbthermo")]
#[command(
    author,
    version,
    about = "usbthermo - Read the OTK-THG01/02 USB thermal sensor"
)]
#[command(long_about = "
Host-side reader for the OTK-THG01/02 16x4 thermopile sensor (USB 04d8:fa87).
Talks to the sensor over its HID interrupt endpoints through libusb.

EXAMPLES:
    # Run the demo sequence (emissivity, refresh rate, frame, raw, EEPROM)
    usbthermo

    # List connected sensors
    usbthermo list

    # Read five frames at 4 Hz as JSON
    usbthermo --refresh-rate 4 --format json frame --count 5

    # Use a specific sensor
    usbthermo --path 0001:0004:00 raw

    # Run with debug logging
    usbthermo --log-level debug eeprom

CONFIGURATION:
    The configuration file is looked up in the following order:
    1. Path specified with --config
    2. ~/.config/usbthermo/config.toml
    3. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Sensor interface to open (BBBB:AAAA:II, as printed by `list`)
    #[arg(short, long, value_name = "PATH")]
    path: Option<HidInterfacePath>,

    /// Emissivity in (0, 1]
    #[arg(short, long, value_name = "E")]
    emissivity: Option<f64>,

    /// Refresh rate in Hz (0.5, 1, 2, 4, 8, 16, 32)
    #[arg(short, long, value_name = "HZ")]
    refresh_rate: Option<RefreshRate>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Action>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// List connected sensors
    List,
    /// Read calibrated thermal frames
    Frame {
        /// Number of frames to read
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Read PTAT, Vcp and raw thermopile values
    Raw,
    /// Dump the calibration EEPROM
    Eeprom,
    /// Configure the sensor, then read a frame, raw data and the EEPROM
    All,
}

/// Sensor settings after merging the command line over the config file
struct SensorOptions {
    emissivity: Option<f64>,
    refresh_rate: Option<RefreshRate>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = ThermoConfig::default();
        let path = ThermoConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = if let Some(ref path) = args.config {
        ThermoConfig::load(Some(path.clone())).context("Failed to load configuration")?
    } else {
        ThermoConfig::load_or_default()
    };

    let log_level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    setup_logging(log_level).context("Failed to setup logging")?;

    debug!("usbthermo v{}", env!("CARGO_PKG_VERSION"));
    debug!("Log level: {}", log_level);

    thermo::init().context("Failed to initialize USB")?;

    let result = run(&args, &config);

    debug!("Shutting down USB...");
    thermo::exit();

    result
}

fn run(args: &Args, config: &ThermoConfig) -> Result<()> {
    let action = args.command.unwrap_or(Action::All);
    let vendor_id = config.device.vendor_id()?;
    let product_id = config.device.product_id()?;

    if action == Action::List {
        let paths = UsbThermo::list_matching(vendor_id, product_id)
            .context("Failed to enumerate sensors")?;
        let text = match args.format {
            OutputFormat::Text => output::paths_text(&paths),
            OutputFormat::Json => {
                let paths: Vec<String> = paths.iter().map(ToString::to_string).collect();
                output::json(&paths)?
            }
        };
        println!("{}", text);
        return Ok(());
    }

    let path = match args.path {
        Some(path) => Some(path),
        None => config.device.interface_path()?,
    };

    let mut sensor = match path {
        Some(ref path) => UsbThermo::open_path(path)
            .with_context(|| format!("Unable to open sensor at {}", path))?,
        None => UsbThermo::open_matching(vendor_id, product_id).with_context(|| {
            format!("Unable to open sensor {:04x}:{:04x}", vendor_id, product_id)
        })?,
    };

    sensor.set_timeout(config.device.timeout());
    sensor.set_command_deadline(config.device.command_deadline());

    let mut options = SensorOptions {
        emissivity: args.emissivity.or(config.sensor.emissivity),
        refresh_rate: args.refresh_rate.or(config.sensor.refresh_rate()?),
    };
    if action == Action::All {
        options.emissivity.get_or_insert(DEMO_EMISSIVITY);
        options.refresh_rate.get_or_insert(DEMO_REFRESH_RATE);
    }

    let result = apply_settings(&mut sensor, &options)
        .and_then(|()| read_and_print(&mut sensor, action, args.format));

    sensor.close();
    result
}

fn apply_settings(sensor: &mut UsbThermo, options: &SensorOptions) -> Result<()> {
    if let Some(emissivity) = options.emissivity {
        sensor
            .set_emissivity(emissivity)
            .with_context(|| format!("Failed to set emissivity {}", emissivity))?;
        info!("Emissivity: {}", emissivity);
    }

    if let Some(rate) = options.refresh_rate {
        sensor
            .set_refresh_rate(rate)
            .with_context(|| format!("Failed to set refresh rate {}", rate))?;
        info!("Refresh rate: {}", rate);
    }

    Ok(())
}

fn read_and_print(sensor: &mut UsbThermo, action: Action, format: OutputFormat) -> Result<()> {
    match action {
        Action::List => Ok(()),
        Action::Frame { count } => {
            let mut frames = Vec::new();
            for index in 0..count {
                let frame = sensor.read_frame().context("Failed to read frame")?;
                match format {
                    OutputFormat::Text => {
                        if index > 0 {
                            println!();
                        }
                        println!("{}", output::frame_text(&frame));
                    }
                    OutputFormat::Json => frames.push(frame),
                }
            }
            if format == OutputFormat::Json {
                println!("{}", output::json(&frames)?);
            }
            Ok(())
        }
        Action::Raw => {
            let raw = sensor.read_raw_data().context("Failed to read raw data")?;
            print(format, &raw, output::raw_text)
        }
        Action::Eeprom => {
            let eeprom = sensor.read_eeprom().context("Failed to read EEPROM")?;
            print(format, &eeprom, output::eeprom_text)
        }
        Action::All => {
            let snapshot = Snapshot {
                frame: sensor.read_frame().context("Failed to read frame")?,
                raw: sensor.read_raw_data().context("Failed to read raw data")?,
                eeprom: sensor.read_eeprom().context("Failed to read EEPROM")?,
            };
            print(format, &snapshot, output::snapshot_text)
        }
    }
}

fn print<T: serde::Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl Fn(&T) -> String,
) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => output::json(value)?,
    };
    println!("{}", rendered);
    Ok(())
}
