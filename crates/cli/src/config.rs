//! Configuration management

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thermo::{HidInterfacePath, RefreshRate};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThermoConfig {
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub sensor: SensorSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// USB vendor ID, e.g. "0x04d8"
    #[serde(default = "DeviceSettings::default_vendor_id")]
    pub vendor_id: String,
    /// USB product ID, e.g. "0xfa87"
    #[serde(default = "DeviceSettings::default_product_id")]
    pub product_id: String,
    /// Open this HID interface instead of the first match (BBBB:AAAA:II)
    #[serde(default)]
    pub path: Option<String>,
    /// Per-transfer timeout in milliseconds
    #[serde(default = "DeviceSettings::default_timeout_ms")]
    pub timeout_ms: u64,
    /// Upper bound on one command exchange in milliseconds (0 = wait forever)
    #[serde(default = "DeviceSettings::default_command_deadline_ms")]
    pub command_deadline_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            vendor_id: Self::default_vendor_id(),
            product_id: Self::default_product_id(),
            path: None,
            timeout_ms: Self::default_timeout_ms(),
            command_deadline_ms: Self::default_command_deadline_ms(),
        }
    }
}

impl DeviceSettings {
    fn default_vendor_id() -> String {
        format!("{:#06x}", thermo::VENDOR_ID)
    }

    fn default_product_id() -> String {
        format!("{:#06x}", thermo::PRODUCT_ID)
    }

    fn default_timeout_ms() -> u64 {
        5000
    }

    fn default_command_deadline_ms() -> u64 {
        10_000
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn command_deadline(&self) -> Option<Duration> {
        (self.command_deadline_ms > 0).then(|| Duration::from_millis(self.command_deadline_ms))
    }

    pub fn vendor_id(&self) -> Result<u16> {
        ThermoConfig::parse_hex_id(&self.vendor_id, "vendor_id")
    }

    pub fn product_id(&self) -> Result<u16> {
        ThermoConfig::parse_hex_id(&self.product_id, "product_id")
    }

    pub fn interface_path(&self) -> Result<Option<HidInterfacePath>> {
        self.path
            .as_deref()
            .map(|p| p.parse().with_context(|| format!("Invalid device path '{}'", p)))
            .transpose()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SensorSettings {
    /// Emissivity applied after open, in (0, 1]
    #[serde(default)]
    pub emissivity: Option<f64>,
    /// Refresh rate applied after open (0.5, 1, 2, 4, 8, 16 or 32)
    #[serde(default)]
    pub refresh_rate_hz: Option<f64>,
}

impl SensorSettings {
    pub fn refresh_rate(&self) -> Result<Option<RefreshRate>> {
        self.refresh_rate_hz
            .map(|hz| {
                RefreshRate::from_hz(hz)
                    .ok_or_else(|| anyhow!("Unsupported refresh rate {} Hz", hz))
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "LoggingSettings::default_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

impl LoggingSettings {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl ThermoConfig {
    /// Load configuration from file
    ///
    /// With no explicit path, the default location is used if it exists,
    /// otherwise built-in defaults.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => {
                let default = Self::default_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let path = expand_tilde(&path);

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ThermoConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults on error
    pub fn load_or_default() -> Self {
        Self::load(None).unwrap_or_else(|e| {
            eprintln!("Warning: {:#}, using defaults", e);
            Self::default()
        })
    }

    /// Default config path: ~/.config/usbthermo/config.toml
    pub fn default_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| expand_tilde(Path::new("~/.config")));
        base.join("usbthermo").join("config.toml")
    }

    /// Save configuration to file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }

        self.device.vendor_id()?;
        self.device.product_id()?;
        self.device.interface_path()?;

        if self.device.timeout_ms == 0 {
            return Err(anyhow!("timeout_ms must be greater than 0"));
        }

        if let Some(e) = self.sensor.emissivity
            && !(e > 0.0 && e <= 1.0)
        {
            return Err(anyhow!("Invalid emissivity {}, must be in (0, 1]", e));
        }

        self.sensor.refresh_rate()?;

        Ok(())
    }

    /// Parse a hex ID such as "0x04d8"
    fn parse_hex_id(id: &str, name: &str) -> Result<u16> {
        let hex_part = id
            .strip_prefix("0x")
            .or_else(|| id.strip_prefix("0X"))
            .ok_or_else(|| {
                anyhow!(
                    "Invalid {} '{}', must start with '0x' (e.g., '0x04d8')",
                    name,
                    id
                )
            })?;

        if hex_part.is_empty() || hex_part.len() > 4 {
            return Err(anyhow!(
                "Invalid {} '{}', hex part must be 1-4 digits",
                name,
                id
            ));
        }

        u16::from_str_radix(hex_part, 16)
            .map_err(|_| anyhow!("Invalid {} '{}', not a valid hex number", name, id))
    }
}

/// Expand a leading `~` to the home directory
fn expand_tilde(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}
