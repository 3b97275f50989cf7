//! Bilinear upscaling.
//!
//! Uses the `image` crate's triangle filter, which is bilinear interpolation.
//! Returns new images without modifying the input.

use image::imageops::FilterType;
use thiserror::Error;

use crate::decode::{from_dynamic, RasterImage};

/// Errors from resize operations.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Source image has no pixels.
    #[error("Cannot resize an empty {width}x{height} image")]
    EmptyImage { width: u32, height: u32 },

    /// Pixel buffer does not match the declared geometry.
    #[error("Pixel buffer does not match {width}x{height} {format}")]
    BufferMismatch {
        width: u32,
        height: u32,
        format: &'static str,
    },
}

/// Scale factor applied by the resize stage, as the fraction 3/2.
const SCALE_NUM: u64 = 3;
const SCALE_DEN: u64 = 2;

/// Target dimensions for the resize stage: `floor(w × 1.5)` by `floor(h × 1.5)`.
///
/// Integer arithmetic keeps the floor exact for every `u32` input.
pub fn scaled_dimensions(width: u32, height: u32) -> (u32, u32) {
    let scale = |v: u32| (v as u64 * SCALE_NUM / SCALE_DEN).min(u32::MAX as u64) as u32;
    (scale(width), scale(height))
}

/// Resize an image to exact dimensions with bilinear interpolation.
///
/// The pixel format is preserved.
pub fn resize_exact(
    image: &RasterImage,
    width: u32,
    height: u32,
) -> Result<RasterImage, TransformError> {
    if image.is_empty() || width == 0 || height == 0 {
        return Err(TransformError::EmptyImage {
            width: image.width,
            height: image.height,
        });
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let source = image.to_dynamic().ok_or(TransformError::BufferMismatch {
        width: image.width,
        height: image.height,
        format: image.format.as_str(),
    })?;

    let resized = source.resize_exact(width, height, FilterType::Triangle);
    let out = from_dynamic(resized);
    debug_assert_eq!(out.format, image.format);
    Ok(out)
}

/// Scale an image to 150% of its size per axis.
pub fn resize_150(image: &RasterImage) -> Result<RasterImage, TransformError> {
    let (width, height) = scaled_dimensions(image.width, image.height);
    resize_exact(image, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::PixelFormat;

    fn create_test_image(width: u32, height: u32) -> RasterImage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x % 256) as u8);
                pixels.push((y % 256) as u8);
                pixels.push(128);
            }
        }
        RasterImage {
            width,
            height,
            format: PixelFormat::Rgb8,
            pixels,
        }
    }

    #[test]
    fn test_scaled_dimensions_floor() {
        assert_eq!(scaled_dimensions(100, 100), (150, 150));
        assert_eq!(scaled_dimensions(3, 5), (4, 7));
        assert_eq!(scaled_dimensions(1, 1), (1, 1));
        assert_eq!(scaled_dimensions(640, 481), (960, 721));
    }

    #[test]
    fn test_resize_150_square() {
        let img = create_test_image(100, 100);
        let resized = resize_150(&img).unwrap();

        assert_eq!(resized.width, 150);
        assert_eq!(resized.height, 150);
        assert_eq!(resized.pixels.len(), 150 * 150 * 3);
    }

    #[test]
    fn test_resize_keeps_luma_format() {
        let img = RasterImage {
            width: 10,
            height: 4,
            format: PixelFormat::Luma8,
            pixels: vec![50u8; 40],
        };
        let resized = resize_150(&img).unwrap();

        assert_eq!(resized.format, PixelFormat::Luma8);
        assert_eq!((resized.width, resized.height), (15, 6));
        // Uniform input stays uniform under bilinear interpolation
        assert!(resized.pixels.iter().all(|&p| p == 50));
    }

    #[test]
    fn test_resize_same_dimensions() {
        let img = create_test_image(100, 100);
        let resized = resize_exact(&img, 100, 100).unwrap();
        assert_eq!(resized, img);
    }

    #[test]
    fn test_resize_empty_image() {
        let img = RasterImage {
            width: 0,
            height: 0,
            format: PixelFormat::Rgb8,
            pixels: vec![],
        };
        assert!(matches!(
            resize_150(&img),
            Err(TransformError::EmptyImage { .. })
        ));
    }

    #[test]
    fn test_resize_buffer_mismatch() {
        let img = RasterImage {
            width: 4,
            height: 4,
            format: PixelFormat::Rgb8,
            pixels: vec![0u8; 10],
        };
        assert!(matches!(
            resize_150(&img),
            Err(TransformError::BufferMismatch { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::decode::PixelFormat;
    use proptest::prelude::*;

    proptest! {
        /// Property: output is floor(1.5x) on both axes.
        #[test]
        fn prop_resize_dimensions(width in 1u32..=64, height in 1u32..=64) {
            let img = RasterImage {
                width,
                height,
                format: PixelFormat::Rgb8,
                pixels: vec![77u8; (width * height * 3) as usize],
            };
            let resized = resize_150(&img).unwrap();

            prop_assert_eq!(resized.width, (width as f64 * 1.5).floor() as u32);
            prop_assert_eq!(resized.height, (height as f64 * 1.5).floor() as u32);
            prop_assert_eq!(resized.pixels.len(), (resized.width * resized.height * 3) as usize);
        }
    }
}
