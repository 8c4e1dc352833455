//! Data models for Droppy compression.
//!
//! This module contains the small value types shared by the compression
//! search, the encoders and the job layer:
//! - Enums for media kind and preset level
//! - Compression mode (preset or target size)
//! - Target byte budget

mod enums;
mod target;

pub use enums::{CompressionLevel, CompressionMode, MediaKind};
pub use target::TargetSize;
