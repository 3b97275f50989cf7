//! The three pipeline stages and their hand-off naming.
//!
//! Stages are chained only through object keys: each stage reads from its
//! source prefix and writes the same file name under the next prefix.

use std::fmt;
use std::str::FromStr;

use imgchain_core::{resize_150, rotate_180, to_grayscale, RasterImage, TransformError};

use crate::storage::StorageLocation;

pub const INPUT_PREFIX: &str = "input/";
pub const STAGE1_PREFIX: &str = "stage1/";
pub const STAGE2_PREFIX: &str = "stage2/";
pub const OUTPUT_PREFIX: &str = "output/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// 180° rotation, `input/` → `stage1/`.
    Rotate,
    /// 150% scale, `stage1/` → `stage2/`.
    Resize,
    /// BT.709 luma, `stage2/` → `output/`.
    Grayscale,
}

impl Stage {
    /// Stages in pipeline order.
    pub const ALL: [Stage; 3] = [Stage::Rotate, Stage::Resize, Stage::Grayscale];

    /// Default operation label reported for this stage.
    pub fn operation(self) -> &'static str {
        match self {
            Stage::Rotate => "rotate",
            Stage::Resize => "resize",
            Stage::Grayscale => "grayscale",
        }
    }

    /// Prefix of the keys whose notifications trigger this stage.
    pub fn source_prefix(self) -> &'static str {
        match self {
            Stage::Rotate => INPUT_PREFIX,
            Stage::Resize => STAGE1_PREFIX,
            Stage::Grayscale => STAGE2_PREFIX,
        }
    }

    /// Prefix this stage writes under.
    pub fn next_prefix(self) -> &'static str {
        match self {
            Stage::Rotate => STAGE1_PREFIX,
            Stage::Resize => STAGE2_PREFIX,
            Stage::Grayscale => OUTPUT_PREFIX,
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Stage::Rotate => "Image rotated successfully",
            Stage::Resize => "Image resized successfully",
            Stage::Grayscale => "Image converted to grayscale successfully",
        }
    }

    /// Run this stage's transform.
    pub fn apply(self, image: &RasterImage) -> Result<RasterImage, TransformError> {
        match self {
            Stage::Rotate => Ok(rotate_180(image)),
            Stage::Resize => resize_150(image),
            Stage::Grayscale => Ok(to_grayscale(image)),
        }
    }

    /// Where the output for `source` goes: same bucket, next prefix plus the
    /// source file name. Only the file name survives, whatever the source
    /// prefix was.
    pub fn next_location(self, source: &StorageLocation) -> StorageLocation {
        StorageLocation::new(
            source.bucket.clone(),
            format!("{}{}", self.next_prefix(), source.filename()),
        )
    }

    /// The stage triggered by writes to `key`, if any.
    pub fn for_key(key: &str) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .find(|stage| key.starts_with(stage.source_prefix()))
    }

    /// The stage fed by this one's output.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Rotate => Some(Stage::Resize),
            Stage::Resize => Some(Stage::Grayscale),
            Stage::Grayscale => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStage(pub String);

impl fmt::Display for UnknownStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown stage {:?}, expected rotate, resize or grayscale",
            self.0
        )
    }
}

impl std::error::Error for UnknownStage {}

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rotate" => Ok(Stage::Rotate),
            "resize" => Ok(Stage::Resize),
            "grayscale" | "greyscale" => Ok(Stage::Grayscale),
            _ => Err(UnknownStage(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgchain_core::PixelFormat;

    fn rgb(width: u32, height: u32) -> RasterImage {
        let pixels = (0..width * height * 3).map(|i| (i % 251) as u8).collect();
        RasterImage::new(width, height, PixelFormat::Rgb8, pixels).unwrap()
    }

    #[test]
    fn test_hand_off_keys() {
        let input = StorageLocation::new("b", "input/photo.jpg");
        let stage1 = Stage::Rotate.next_location(&input);
        let stage2 = Stage::Resize.next_location(&stage1);
        let output = Stage::Grayscale.next_location(&stage2);

        assert_eq!(stage1, StorageLocation::new("b", "stage1/photo.jpg"));
        assert_eq!(stage2, StorageLocation::new("b", "stage2/photo.jpg"));
        assert_eq!(output, StorageLocation::new("b", "output/photo.jpg"));
    }

    #[test]
    fn test_next_location_uses_basename_only() {
        let nested = StorageLocation::new("b", "input/2024/07/photo.jpg");
        assert_eq!(Stage::Rotate.next_location(&nested).key, "stage1/photo.jpg");

        let bare = StorageLocation::new("b", "photo.jpg");
        assert_eq!(Stage::Resize.next_location(&bare).key, "stage2/photo.jpg");
    }

    #[test]
    fn test_for_key() {
        assert_eq!(Stage::for_key("input/a.jpg"), Some(Stage::Rotate));
        assert_eq!(Stage::for_key("stage1/a.jpg"), Some(Stage::Resize));
        assert_eq!(Stage::for_key("stage2/a.jpg"), Some(Stage::Grayscale));
        assert_eq!(Stage::for_key("output/a.jpg"), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Rotate".parse::<Stage>(), Ok(Stage::Rotate));
        assert_eq!("greyscale".parse::<Stage>(), Ok(Stage::Grayscale));
        assert!("blur".parse::<Stage>().is_err());
        for stage in Stage::ALL {
            assert_eq!(stage.to_string().parse::<Stage>(), Ok(stage));
        }
    }

    #[test]
    fn test_apply_shapes() {
        let img = rgb(10, 4);

        let rotated = Stage::Rotate.apply(&img).unwrap();
        assert_eq!((rotated.width, rotated.height), (10, 4));

        let resized = Stage::Resize.apply(&img).unwrap();
        assert_eq!((resized.width, resized.height), (15, 6));
        assert_eq!(resized.format, PixelFormat::Rgb8);

        let gray = Stage::Grayscale.apply(&img).unwrap();
        assert_eq!(gray.format, PixelFormat::Luma8);
        assert_eq!(gray.pixels.len(), 40);
    }

    #[test]
    fn test_next_chain() {
        assert_eq!(Stage::Rotate.next(), Some(Stage::Resize));
        assert_eq!(Stage::Grayscale.next(), None);
    }
}
