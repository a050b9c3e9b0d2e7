//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub link: LinkConfig,
    pub sampling: SamplingConfig,
    pub keyboard: KeyboardConfig,
    pub gamepad: GamepadConfig,
    pub mouse: MouseConfig,
    pub logging: LoggingConfig,
}

/// Control link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,

    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
}

/// Sampling loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SamplingConfig {
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,
}

/// Keyboard (incremental mode) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct KeyboardConfig {
    #[serde(default = "default_key_step")]
    pub step: f32,

    #[serde(default = "default_key_decay")]
    pub decay: f32,
}

/// Gamepad (absolute mode) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GamepadConfig {
    #[serde(default = "default_deadzone")]
    pub deadzone: f32,
}

/// Mouse (relative mode) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MouseConfig {
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,

    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Directory for rotating log files. Empty disables file logging.
    #[serde(default)]
    pub dir: String,

    #[serde(default = "default_status_interval_ticks")]
    pub status_interval_ticks: u64,
}

// Default value functions
fn default_endpoint() -> String { "127.0.0.1:8000".to_string() }
fn default_connect_timeout_ms() -> u64 { 3000 }
fn default_reconnect_base_ms() -> u64 { 500 }
fn default_reconnect_max_ms() -> u64 { 8000 }

fn default_tick_rate_hz() -> u32 { 50 }

fn default_key_step() -> f32 { 0.1 }
fn default_key_decay() -> f32 { 0.05 }

fn default_deadzone() -> f32 { 0.08 }

fn default_sensitivity() -> f32 { 0.02 }
fn default_lock_timeout_ms() -> u64 { 2000 }

fn default_status_interval_ticks() -> u64 { 250 }

impl Default for Config {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            sampling: SamplingConfig::default(),
            keyboard: KeyboardConfig::default(),
            gamepad: GamepadConfig::default(),
            mouse: MouseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout_ms: default_connect_timeout_ms(),
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { tick_rate_hz: default_tick_rate_hz() }
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self { step: default_key_step(), decay: default_key_decay() }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self { deadzone: default_deadzone() }
    }
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: String::new(),
            status_interval_ticks: default_status_interval_ticks(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use teleop_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.link.endpoint.is_empty() {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom("link endpoint cannot be empty")
            ));
        }

        if self.link.connect_timeout_ms == 0 || self.link.connect_timeout_ms > 30000 {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom("connect_timeout_ms must be between 1 and 30000")
            ));
        }

        if self.link.reconnect_base_ms == 0 || self.link.reconnect_base_ms > 60000 {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom("reconnect_base_ms must be between 1 and 60000")
            ));
        }

        if self.link.reconnect_max_ms < self.link.reconnect_base_ms
            || self.link.reconnect_max_ms > 120_000
        {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom(
                    "reconnect_max_ms must be between reconnect_base_ms and 120000",
                )
            ));
        }

        if self.sampling.tick_rate_hz == 0 || self.sampling.tick_rate_hz > 250 {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom("tick_rate_hz must be between 1 and 250")
            ));
        }

        if !(self.keyboard.step > 0.0 && self.keyboard.step <= 1.0) {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom("keyboard step must be in (0, 1]")
            ));
        }

        if !(self.keyboard.decay > 0.0 && self.keyboard.decay <= 1.0) {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom("keyboard decay must be in (0, 1]")
            ));
        }

        if !(0.0..=0.25).contains(&self.gamepad.deadzone) {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom("gamepad deadzone must be between 0.0 and 0.25")
            ));
        }

        if !(self.mouse.sensitivity > 0.0 && self.mouse.sensitivity <= 1.0) {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom("mouse sensitivity must be in (0, 1]")
            ));
        }

        if self.mouse.lock_timeout_ms == 0 || self.mouse.lock_timeout_ms > 10000 {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom("lock_timeout_ms must be between 1 and 10000")
            ));
        }

        if self.logging.status_interval_ticks == 0 {
            return Err(crate::error::TeleopError::Config(
                toml::de::Error::custom("status_interval_ticks must be greater than 0")
            ));
        }

        Ok(())
    }

    /// Tick period derived from the configured sampling rate
    #[must_use]
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(1000 / u64::from(self.sampling.tick_rate_hz))
    }
}
