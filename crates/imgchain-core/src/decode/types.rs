//! Core types for image decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte stream is not a recognized image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// Pixel buffer length does not match the declared geometry.
    #[error("Pixel buffer mismatch: expected {expected} bytes, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },
}

/// Pixel layout of a [`RasterImage`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 8-bit RGB, three bytes per pixel.
    #[default]
    Rgb8,
    /// 8-bit luma, one byte per pixel.
    Luma8,
}

impl PixelFormat {
    /// Number of channels (and bytes) per pixel.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Luma8 => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PixelFormat::Rgb8 => "rgb8",
            PixelFormat::Luma8 => "luma8",
        }
    }
}

/// A decoded raster image.
///
/// One instance belongs to exactly one invocation; transforms consume a
/// reference and return a fresh image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Layout of `pixels`.
    pub format: PixelFormat,
    /// Pixel data in row-major order.
    /// Length is `width * height * format.channels()`.
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Create a RasterImage, checking the buffer against the geometry.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> Result<Self, DecodeError> {
        let expected = width as usize * height as usize * format.channels();
        if pixels.len() != expected {
            return Err(DecodeError::BufferMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    /// Create a RasterImage from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            format: PixelFormat::Rgb8,
            pixels: img.into_raw(),
        }
    }

    /// Create a RasterImage from an image::GrayImage.
    pub fn from_gray_image(img: image::GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            format: PixelFormat::Luma8,
            pixels: img.into_raw(),
        }
    }

    /// Convert into the matching `DynamicImage` variant.
    ///
    /// Returns `None` if the buffer does not match the dimensions.
    pub fn to_dynamic(&self) -> Option<image::DynamicImage> {
        match self.format {
            PixelFormat::Rgb8 => {
                image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
                    .map(image::DynamicImage::ImageRgb8)
            }
            PixelFormat::Luma8 => {
                image::GrayImage::from_raw(self.width, self.height, self.pixels.clone())
                    .map(image::DynamicImage::ImageLuma8)
            }
        }
    }

    /// Number of channels per pixel.
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_format_channels() {
        assert_eq!(PixelFormat::Rgb8.channels(), 3);
        assert_eq!(PixelFormat::Luma8.channels(), 1);
    }

    #[test]
    fn test_pixel_format_names() {
        assert_eq!(PixelFormat::Rgb8.as_str(), "rgb8");
        assert_eq!(PixelFormat::Luma8.as_str(), "luma8");
    }

    #[test]
    fn test_raster_image_creation() {
        let img = RasterImage::new(100, 50, PixelFormat::Rgb8, vec![0u8; 100 * 50 * 3]).unwrap();

        assert_eq!(img.width, 100);
        assert_eq!(img.height, 50);
        assert_eq!(img.pixel_count(), 5000);
        assert_eq!(img.channels(), 3);
        assert!(!img.is_empty());
    }

    #[test]
    fn test_raster_image_rejects_short_buffer() {
        let result = RasterImage::new(10, 10, PixelFormat::Luma8, vec![0u8; 99]);
        match result {
            Err(DecodeError::BufferMismatch { expected, actual }) => {
                assert_eq!(expected, 100);
                assert_eq!(actual, 99);
            }
            other => panic!("Expected BufferMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_raster_image_empty() {
        let img = RasterImage::new(0, 0, PixelFormat::Rgb8, vec![]).unwrap();
        assert!(img.is_empty());
    }

    #[test]
    fn test_to_dynamic_keeps_format() {
        let gray = RasterImage::new(4, 2, PixelFormat::Luma8, vec![7u8; 8]).unwrap();
        let dynamic = gray.to_dynamic().unwrap();
        assert_eq!(dynamic.color(), image::ColorType::L8);

        let rgb = RasterImage::new(4, 2, PixelFormat::Rgb8, vec![7u8; 24]).unwrap();
        let dynamic = rgb.to_dynamic().unwrap();
        assert_eq!(dynamic.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::CorruptedFile("unexpected EOF".to_string());
        assert_eq!(
            err.to_string(),
            "Corrupted or incomplete image file: unexpected EOF"
        );

        let err = DecodeError::InvalidFormat;
        assert_eq!(err.to_string(), "Invalid or unsupported image format");
    }
}
