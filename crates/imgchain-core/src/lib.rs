//! imgchain core - raster codec and transforms
//!
//! This crate provides the pixel-level half of the imgchain pipeline: decoding
//! inbound bytes, the three stage transforms, and JPEG output encoding. It has
//! no notion of storage or invocations; see `imgchain-handlers` for that.

pub mod decode;
pub mod encode;
pub mod transform;

pub use decode::{decode_image, DecodeError, PixelFormat, RasterImage};
pub use encode::{encode_jpeg, EncodeError, DEFAULT_JPEG_QUALITY, OUTPUT_CONTENT_TYPE};
pub use transform::{resize_150, rotate_180, to_grayscale, TransformError};
