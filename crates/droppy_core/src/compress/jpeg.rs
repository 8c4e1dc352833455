//! JPEG quality encoder.
//!
//! Decodes the source once and re-encodes it as baseline JPEG at the
//! requested quality factor. Transparency is flattened since JPEG has no
//! alpha channel.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, RgbImage};

use super::error::{CompressError, CompressResult};
use super::search::Encoder;

/// Map a quality factor in `[0, 1]` to the encoder's `1..=100` scale.
pub fn quality_percent(quality: f64) -> u8 {
    if !quality.is_finite() {
        return 1;
    }
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encodes a decoded image as JPEG for a given quality factor.
pub struct JpegQualityEncoder {
    pixels: RgbImage,
}

impl JpegQualityEncoder {
    /// Decode an image from memory (any format the `image` crate reads).
    pub fn from_bytes(bytes: &[u8]) -> CompressResult<Self> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| CompressError::Decode(e.to_string()))?;

        tracing::debug!(
            "[JPEG] Decoded {}x{} source ({:?})",
            decoded.width(),
            decoded.height(),
            decoded.color()
        );

        Ok(Self {
            pixels: decoded.to_rgb8(),
        })
    }

    /// Decode an image file.
    pub fn open(path: &Path) -> CompressResult<Self> {
        if !path.exists() {
            return Err(CompressError::SourceNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Source dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Encode at a quality factor in `[0, 1]`.
    pub fn encode_quality(&self, quality: f64) -> CompressResult<Vec<u8>> {
        let percent = quality_percent(quality);
        let mut buffer = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, percent);

        encoder
            .encode(
                self.pixels.as_raw(),
                self.pixels.width(),
                self.pixels.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| CompressError::encode_failed(quality, e.to_string()))?;

        let data = buffer.into_inner();
        tracing::trace!("[JPEG] quality {} -> {} bytes", percent, data.len());
        Ok(data)
    }
}

impl Encoder for JpegQualityEncoder {
    fn encode(&mut self, parameter: f64) -> CompressResult<Vec<u8>> {
        self.encode_quality(parameter)
    }
}
