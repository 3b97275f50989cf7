//! Image decoding for imgchain.
//!
//! This module provides functionality for:
//! - Decoding inbound bytes (JPEG, PNG) to a [`RasterImage`]
//! - The raster type shared by every transform
//!
//! # Architecture
//!
//! Decoding is synchronous and allocation-bound; each stage invocation owns
//! the image it decodes and never shares it.
//!
//! # Examples
//!
//! ```ignore
//! use imgchain_core::decode::decode_image;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod reader;
mod types;

pub use reader::{decode_image, from_dynamic};
pub use types::{DecodeError, PixelFormat, RasterImage};
