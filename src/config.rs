//! Application configuration
//!
//! Plain-data configuration loaded from a TOML file. User settings override
//! the built-in defaults field by field; unknown keys are ignored. The file
//! is never executed, only deserialized.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, Result};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log verbosity ("error", "warn", "info", "debug", "trace")
    pub log_level: String,
    /// GPIO character device the output lines live on
    pub gpio_chip: String,
    /// Indicator LED line, driven high for the duration of every pulse
    pub led_gpio: u32,
    /// Controllable target machines, in menu order
    pub systems: Vec<SystemConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            gpio_chip: "/dev/gpiochip0".to_string(),
            led_gpio: 16,
            systems: vec![SystemConfig {
                gpio_on: 21,
                gpio_reboot: 20,
                label: "Test machine".to_string(),
            }],
        }
    }
}

/// One controllable target machine
///
/// All three fields are required; an entry missing any of them fails the
/// configuration load.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SystemConfig {
    /// Line wired to the power button
    pub gpio_on: u32,
    /// Line wired to the reboot button
    pub gpio_reboot: u32,
    /// Human-readable name shown in the menu
    pub label: String,
}

impl AppConfig {
    /// Load configuration from the given file, or defaults if it does not exist
    ///
    /// Runs before logging is initialized, so it stays silent; the caller
    /// reports which file was used.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Resolve the configuration file path
///
/// `POWERCTL_CONFIG` takes precedence, then `~/.config/powerctl/config.toml`,
/// then a system-wide fallback.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("POWERCTL_CONFIG") {
        return PathBuf::from(path);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config/powerctl/config.toml");
    }

    PathBuf::from("/etc/powerctl/config.toml")
}
