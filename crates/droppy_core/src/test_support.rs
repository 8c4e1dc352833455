//! Fixtures shared by unit tests.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// PNG of deterministic per-channel noise.
///
/// Noise barely compresses as PNG but JPEG size tracks quality closely,
/// which makes it a good subject for the size search.
pub fn noisy_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        (state >> 24) as u8
    };
    let img = RgbImage::from_fn(width, height, |_, _| Rgb([next(), next(), next()]));

    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode test PNG");
    out.into_inner()
}

/// Tiny single-colour PNG; any JPEG re-encode is larger than it.
pub fn flat_png(size: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(size, size, Rgb([200, 40, 90]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode test PNG");
    out.into_inner()
}
