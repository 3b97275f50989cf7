//! Byte-stream decoding into [`RasterImage`].

use std::io::Cursor;

use image::{ColorType, DynamicImage, ImageReader};

use super::{DecodeError, RasterImage};

/// Decode an encoded image from bytes.
///
/// The container format is sniffed from the leading bytes, so anything the
/// enabled `image` codecs understand is accepted. Single-channel sources stay
/// single-channel (`Luma8`); everything else is normalised to `Rgb8`.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognised.
/// Returns `DecodeError::CorruptedFile` if the stream is truncated or corrupt.
pub fn decode_image(bytes: &[u8]) -> Result<RasterImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    Ok(from_dynamic(img))
}

/// Normalise a `DynamicImage` to one of the two raster layouts.
pub fn from_dynamic(img: DynamicImage) -> RasterImage {
    match img.color() {
        ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            RasterImage::from_gray_image(img.into_luma8())
        }
        _ => RasterImage::from_rgb_image(img.into_rgb8()),
    }
}
