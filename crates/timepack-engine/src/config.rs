//! Configuration types for timepack.
//!
//! This module defines the layout constants used by the packer and the
//! visible day window of a timeline view.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pixel constants used when converting packed columns into geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Pixels per hour of event duration.
    #[serde(default = "default_hour_height")]
    pub hour_height: f64,

    /// Gutter subtracted from every event width.
    #[serde(default = "default_right_margin")]
    pub right_margin: f64,

    /// Width of the hour-label sidebar, excluded from the event area.
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: f64,

    /// Clamp negative widths and heights to zero.
    #[serde(default)]
    pub clamp_negative: bool,
}

fn default_hour_height() -> f64 {
    100.0
}

fn default_right_margin() -> f64 {
    10.0
}

fn default_sidebar_width() -> f64 {
    50.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            hour_height: default_hour_height(),
            right_margin: default_right_margin(),
            sidebar_width: default_sidebar_width(),
            clamp_negative: false,
        }
    }
}

/// Main configuration for a timeline view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// First visible hour of the day.
    #[serde(default)]
    pub day_start: u32,

    /// Last visible hour of the day.
    #[serde(default = "default_day_end")]
    pub day_end: u32,

    /// Scroll to the earliest event when the view opens.
    #[serde(default)]
    pub scroll_to_first: bool,

    /// Pixel constants.
    #[serde(default)]
    pub layout: LayoutConfig,
}

fn default_day_end() -> u32 {
    24
}

impl Default for Config {
    fn default() -> Self {
        Self {
            day_start: 0,
            day_end: default_day_end(),
            scroll_to_first: false,
            layout: LayoutConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: Self = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Check the day window and pixel scale.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.day_start >= self.day_end || self.day_end > 24 {
            return Err(ConfigError::InvalidDayWindow {
                start: self.day_start,
                end: self.day_end,
            });
        }
        if !self.layout.hour_height.is_finite() || self.layout.hour_height <= 0.0 {
            return Err(ConfigError::InvalidHourHeight(self.layout.hour_height));
        }
        Ok(())
    }

    /// Number of hours between `day_start` and `day_end`.
    pub fn visible_hours(&self) -> u32 {
        self.day_end.saturating_sub(self.day_start)
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Day window is empty or extends past midnight.
    #[error("Invalid day window: {start}..{end} (need start < end <= 24)")]
    InvalidDayWindow { start: u32, end: u32 },

    /// Hour height must be positive and finite.
    #[error("Invalid hour height: {0} (must be positive and finite)")]
    InvalidHourHeight(f64),
}
