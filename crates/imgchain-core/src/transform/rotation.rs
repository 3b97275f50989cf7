//! Half-turn rotation.
//!
//! Rotating by π about the image center is the affine map
//! `translate(w, h) · rotate(π)`, which sends source pixel `(x, y)` to
//! `(w - 1 - x, h - 1 - y)` on the integer grid. That is a horizontal plus a
//! vertical flip, so no resampling happens and the operation is exactly
//! invertible.

use crate::decode::RasterImage;

/// Rotate an image by 180° about its center.
///
/// Output dimensions and pixel format equal the input's. In row-major order
/// the mapping reverses the sequence of pixels while keeping each pixel's
/// channel bytes in place.
pub fn rotate_180(image: &RasterImage) -> RasterImage {
    let channels = image.channels();
    let mut pixels = Vec::with_capacity(image.pixels.len());
    for pixel in image.pixels.chunks_exact(channels).rev() {
        pixels.extend_from_slice(pixel);
    }

    RasterImage {
        width: image.width,
        height: image.height,
        format: image.format,
        pixels,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::decode::PixelFormat;
    use proptest::prelude::*;

    fn image_strategy() -> impl Strategy<Value = RasterImage> {
        (1u32..=40, 1u32..=40, prop_oneof![Just(PixelFormat::Rgb8), Just(PixelFormat::Luma8)])
            .prop_flat_map(|(w, h, format)| {
                let size = (w * h) as usize * format.channels();
                prop::collection::vec(any::<u8>(), size..=size).prop_map(move |pixels| {
                    RasterImage {
                        width: w,
                        height: h,
                        format,
                        pixels,
                    }
                })
            })
    }

    proptest! {
        /// Property: a half turn applied twice is the identity.
        #[test]
        fn prop_rotate_twice_is_identity(img in image_strategy()) {
            let twice = rotate_180(&rotate_180(&img));
            prop_assert_eq!(twice, img);
        }

        /// Property: the pixel at (x, y) lands on (w-1-x, h-1-y).
        #[test]
        fn prop_pixel_mapping(img in image_strategy(), fx in 0.0f64..1.0, fy in 0.0f64..1.0) {
            let x = (fx * img.width as f64) as u32;
            let y = (fy * img.height as f64) as u32;
            let ch = img.channels();
            let rotated = rotate_180(&img);

            let src = (y * img.width + x) as usize * ch;
            let dst = ((img.height - 1 - y) * img.width + (img.width - 1 - x)) as usize * ch;
            prop_assert_eq!(&rotated.pixels[dst..dst + ch], &img.pixels[src..src + ch]);
        }
    }
}
