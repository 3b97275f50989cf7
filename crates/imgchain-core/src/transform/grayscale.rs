//! Perceptual grayscale conversion.
//!
//! Luma is the ITU-R BT.709 weighted sum of the (gamma-encoded) channels,
//! the same mapping the `image` crate uses for `to_luma8`.

use crate::decode::{PixelFormat, RasterImage};

/// BT.709 weight of the red channel.
pub const LUMA_R: f32 = 0.2126;
/// BT.709 weight of the green channel.
pub const LUMA_G: f32 = 0.7152;
/// BT.709 weight of the blue channel.
pub const LUMA_B: f32 = 0.0722;

/// Luma of one 8-bit RGB pixel, rounded to the nearest level.
#[inline]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    let y = LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32;
    y.clamp(0.0, 255.0).round() as u8
}

/// Convert an image to single-channel luma.
///
/// Width and height are unchanged; the result is always `Luma8`. A `Luma8`
/// input is returned as a copy.
pub fn to_grayscale(image: &RasterImage) -> RasterImage {
    let pixels = match image.format {
        PixelFormat::Luma8 => image.pixels.clone(),
        PixelFormat::Rgb8 => image
            .pixels
            .chunks_exact(3)
            .map(|p| luma_u8(p[0], p[1], p[2]))
            .collect(),
    };

    RasterImage {
        width: image.width,
        height: image.height,
        format: PixelFormat::Luma8,
        pixels,
    }
}
