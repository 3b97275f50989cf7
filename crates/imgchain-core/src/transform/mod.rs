//! Pixel transforms applied by the pipeline stages.
//!
//! Each function maps one [`RasterImage`](crate::decode::RasterImage) to a new
//! one and leaves its input untouched.
//!
//! # Stage order
//!
//! 1. Rotation by 180°
//! 2. Resize to 150%
//! 3. Grayscale
//!
//! The order is a property of the storage prefixes, not of this module: any
//! transform can be applied to any image.

mod grayscale;
mod resize;
mod rotation;

pub use grayscale::{luma_u8, to_grayscale, LUMA_B, LUMA_G, LUMA_R};
pub use resize::{resize_150, resize_exact, scaled_dimensions, TransformError};
pub use rotation::rotate_180;
