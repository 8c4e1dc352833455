//! Target-size compression.
//!
//! Provides:
//! - A bounded bisection search over an encode parameter (`search`)
//! - A JPEG quality encoder built on the `image` crate (`jpeg`)
//! - An analytic bitrate plan and two-pass FFmpeg encode (`video`)
//! - FFprobe media inspection (`probe`)
//!
//! # Example
//!
//! ```no_run
//! use droppy_core::compress::{search_target_size, JpegQualityEncoder, SearchConfig};
//! use droppy_core::models::TargetSize;
//!
//! let source = std::fs::read("photo.png").unwrap();
//! let mut encoder = JpegQualityEncoder::from_bytes(&source).unwrap();
//! let target = TargetSize::from_kilobytes(500.0).unwrap();
//!
//! let outcome = search_target_size(&mut encoder, target, &SearchConfig::image()).unwrap();
//! println!("quality {:.2} -> {} bytes", outcome.parameter, outcome.data.len());
//! ```

mod error;
pub mod jpeg;
pub mod probe;
mod search;
pub mod video;

pub use error::{CompressError, CompressResult};
pub use jpeg::JpegQualityEncoder;
pub use probe::{probe_media, MediaInfo};
pub use search::{search_target_size, Encoder, SearchConfig, SearchOutcome};
pub use video::{plan_bitrate, VideoBitratePlan, VideoEncoder, VideoOutcome};
