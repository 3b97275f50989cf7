//! Output encoding for imgchain.
//!
//! Stages always emit JPEG, whatever the input codec was.
//!
//! # Examples
//!
//! ```ignore
//! use imgchain_core::encode::{encode_jpeg, DEFAULT_JPEG_QUALITY};
//!
//! let jpeg_bytes = encode_jpeg(&image, DEFAULT_JPEG_QUALITY).unwrap();
//! println!("Encoded {} bytes", jpeg_bytes.len());
//! ```

mod jpeg;

pub use jpeg::{encode_jpeg, EncodeError, DEFAULT_JPEG_QUALITY, OUTPUT_CONTENT_TYPE};
