//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::compress::SearchConfig;
use crate::logging::{LogConfig, LogLevel};
use crate::models::CompressionLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Image compression settings.
    #[serde(default)]
    pub image: ImageSettings,

    /// Video compression settings.
    #[serde(default)]
    pub video: VideoSettings,
}

/// Config file sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Image,
    Video,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Image,
        ConfigSection::Video,
    ];

    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Image => "image",
            ConfigSection::Video => "video",
        }
    }

    /// Comment written above the section.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and working directories",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Image => "Image (JPEG) compression",
            ConfigSection::Video => "Video (FFmpeg) compression",
        }
    }
}

/// Path configuration for output, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for compressed files. Empty writes next to the source.
    #[serde(default)]
    pub output_folder: String,

    /// Root folder for temporary files (pass logs, partial outputs).
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: String::new(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level written to job logs.
    #[serde(default)]
    pub level: LogLevel,

    /// Keep FFmpeg output out of the log unless a job fails.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of FFmpeg lines to show on failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix log lines with a timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Write a per-job log file.
    #[serde(default = "default_true")]
    pub job_logs: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
            job_logs: true,
        }
    }
}

impl LoggingSettings {
    /// Build a job logger configuration from these settings.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            error_tail: self.error_tail as usize,
            show_timestamps: self.show_timestamps,
        }
    }
}

/// Image compression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSettings {
    /// Lowest JPEG quality factor tried by the target-size search.
    #[serde(default = "default_min_quality")]
    pub min_quality: f64,

    /// Highest JPEG quality factor tried by the target-size search.
    #[serde(default = "default_max_quality")]
    pub max_quality: f64,

    /// Encode budget for the target-size search.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Stop searching once the quality interval is this narrow.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Quality for the light preset.
    #[serde(default = "default_quality_light")]
    pub quality_light: f64,

    /// Quality for the balanced preset.
    #[serde(default = "default_quality_balanced")]
    pub quality_balanced: f64,

    /// Quality for the strong preset.
    #[serde(default = "default_quality_strong")]
    pub quality_strong: f64,
}

fn default_min_quality() -> f64 {
    0.01
}

fn default_max_quality() -> f64 {
    0.85
}

fn default_max_iterations() -> u32 {
    8
}

fn default_tolerance() -> f64 {
    0.005
}

fn default_quality_light() -> f64 {
    0.8
}

fn default_quality_balanced() -> f64 {
    0.6
}

fn default_quality_strong() -> f64 {
    0.4
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            min_quality: default_min_quality(),
            max_quality: default_max_quality(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            quality_light: default_quality_light(),
            quality_balanced: default_quality_balanced(),
            quality_strong: default_quality_strong(),
        }
    }
}

impl ImageSettings {
    /// Search parameters for the target-size mode.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            min: self.min_quality,
            max: self.max_quality,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
        }
    }

    /// JPEG quality factor for a preset level.
    pub fn quality_for(&self, level: CompressionLevel) -> f64 {
        match level {
            CompressionLevel::Light => self.quality_light,
            CompressionLevel::Balanced => self.quality_balanced,
            CompressionLevel::Strong => self.quality_strong,
        }
    }
}

/// Video compression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// FFmpeg binary name or path.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// FFprobe binary name or path.
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    /// FFmpeg video encoder.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Encoder speed preset.
    #[serde(default = "default_encoder_preset")]
    pub encoder_preset: String,

    /// Upper bound for the output audio bitrate.
    #[serde(default = "default_audio_bitrate_kbps")]
    pub audio_bitrate_kbps: u32,

    /// Lowest video bitrate a target-size encode will use.
    #[serde(default = "default_min_video_kbps")]
    pub min_video_kbps: u32,

    /// Fraction of the target budget given to the streams (rest is container overhead).
    #[serde(default = "default_safety_margin")]
    pub safety_margin: f64,

    /// CRF for the light preset.
    #[serde(default = "default_crf_light")]
    pub crf_light: u32,

    /// CRF for the balanced preset.
    #[serde(default = "default_crf_balanced")]
    pub crf_balanced: u32,

    /// CRF for the strong preset.
    #[serde(default = "default_crf_strong")]
    pub crf_strong: u32,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_encoder_preset() -> String {
    "medium".to_string()
}

fn default_audio_bitrate_kbps() -> u32 {
    128
}

fn default_min_video_kbps() -> u32 {
    100
}

fn default_safety_margin() -> f64 {
    0.95
}

fn default_crf_light() -> u32 {
    23
}

fn default_crf_balanced() -> u32 {
    28
}

fn default_crf_strong() -> u32 {
    32
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            video_codec: default_video_codec(),
            encoder_preset: default_encoder_preset(),
            audio_bitrate_kbps: default_audio_bitrate_kbps(),
            min_video_kbps: default_min_video_kbps(),
            safety_margin: default_safety_margin(),
            crf_light: default_crf_light(),
            crf_balanced: default_crf_balanced(),
            crf_strong: default_crf_strong(),
        }
    }
}

impl VideoSettings {
    /// CRF value for a preset level.
    pub fn crf_for(&self, level: CompressionLevel) -> u32 {
        match level {
            CompressionLevel::Light => self.crf_light,
            CompressionLevel::Balanced => self.crf_balanced,
            CompressionLevel::Strong => self.crf_strong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serialize() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        assert!(toml_str.contains("[paths]"));
        assert!(toml_str.contains("[image]"));
        assert!(toml_str.contains("[video]"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let settings: Settings = toml::from_str("[image]\nmax_quality = 0.9\n").unwrap();
        assert_eq!(settings.image.max_quality, 0.9);
        assert_eq!(settings.image.max_iterations, 8);
        assert_eq!(settings.video.ffmpeg, "ffmpeg");
    }

    #[test]
    fn image_search_config_matches_settings() {
        let config = ImageSettings::default().search_config();
        assert_eq!(config, SearchConfig::image());
    }

    #[test]
    fn presets_get_stronger() {
        let image = ImageSettings::default();
        assert!(
            image.quality_for(CompressionLevel::Light) > image.quality_for(CompressionLevel::Strong)
        );

        let video = VideoSettings::default();
        assert!(
            video.crf_for(CompressionLevel::Light) < video.crf_for(CompressionLevel::Strong)
        );
    }
}
