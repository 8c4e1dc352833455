//! Configuration management for Droppy compression.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Defaults filled in on load
//!
//! # Example
//!
//! ```no_run
//! use droppy_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/droppy.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Search budget: {}", config.settings().image.max_iterations);
//!
//! config.settings_mut().video.audio_bitrate_kbps = 96;
//! config.update_section(ConfigSection::Video).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, ImageSettings, LoggingSettings, PathSettings, Settings, VideoSettings,
};
