//! JPEG encoding for stage output.
//!
//! Every stage writes the same codec regardless of what it read, so this is
//! the only encoder in the crate.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use image::ImageEncoder;
use std::io::Cursor;
use thiserror::Error;

use crate::decode::{PixelFormat, RasterImage};

/// MIME type attached to every object a stage writes.
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

/// Default JPEG quality, matching the common encoder default of 75.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Errors that can occur during JPEG encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// JPEG encoding failed
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode a raster image to JPEG bytes.
///
/// `Rgb8` images are written as three-component JPEGs and `Luma8` images as
/// single-component JPEGs, so a grayscale result stays grayscale on disk.
/// `quality` is clamped to 1..=100.
pub fn encode_jpeg(image: &RasterImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = (image.width, image.height);
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = width as usize * height as usize * image.channels();
    if image.pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: image.pixels.len(),
        });
    }

    let color = match image.format {
        PixelFormat::Rgb8 => ExtendedColorType::Rgb8,
        PixelFormat::Luma8 => ExtendedColorType::L8,
    };

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder
        .write_image(&image.pixels, width, height, color)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}


// ============================================================================
// Property-Based Tests
// ============================================================================
