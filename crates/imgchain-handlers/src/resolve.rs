//! Source resolution: turn a classified invocation into a decoded image.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use imgchain_core::{decode_image, RasterImage};

use crate::error::HandlerError;
use crate::invocation::{DirectSource, Invocation};
use crate::metrics::Inspector;
use crate::storage::{ObjectStore, StorageLocation};

/// Where the input image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Inline base64 payload of a direct call.
    Payload,
    /// An object read from storage, by notification or direct call.
    Storage(StorageLocation),
}

impl Provenance {
    /// The source an invocation names, before anything is fetched.
    pub fn of(invocation: &Invocation) -> Provenance {
        match invocation {
            Invocation::EventTriggered(location) => Provenance::Storage(location.clone()),
            Invocation::Direct(request) => match &request.source {
                DirectSource::Payload(_) => Provenance::Payload,
                DirectSource::Storage(location) => Provenance::Storage(location.clone()),
            },
        }
    }

    /// Reported as `input_source`.
    pub fn kind(&self) -> &'static str {
        match self {
            Provenance::Payload => "payload",
            Provenance::Storage(_) => "storage",
        }
    }

    pub fn location(&self) -> Option<&StorageLocation> {
        match self {
            Provenance::Payload => None,
            Provenance::Storage(location) => Some(location),
        }
    }

    /// Record `input_source` and, for storage inputs, `s3_bucket` and `s3_key`.
    pub fn record(&self, inspector: &mut Inspector) {
        inspector.add_attribute("input_source", self.kind());
        if let Some(location) = self.location() {
            inspector.add_attribute("s3_bucket", location.bucket.as_str());
            inspector.add_attribute("s3_key", location.key.as_str());
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub image: RasterImage,
    pub provenance: Provenance,
    /// Size of the encoded input in bytes.
    pub input_size: usize,
}

/// Fetch or decode the image an invocation refers to.
///
/// Bad base64 and undecodable bytes are `Decode` errors; there is no fallback
/// to another source.
pub fn resolve(invocation: &Invocation, store: &dyn ObjectStore) -> Result<ResolvedImage, HandlerError> {
    let bytes = match invocation {
        Invocation::EventTriggered(location) => store.get(location)?,
        Invocation::Direct(request) => match &request.source {
            DirectSource::Payload(data) => STANDARD.decode(data.trim())?,
            DirectSource::Storage(location) => store.get(location)?,
        },
    };
    let provenance = Provenance::of(invocation);

    log::debug!("resolved {} bytes from {}", bytes.len(), provenance.kind());
    let image = decode_image(&bytes)?;
    Ok(ResolvedImage {
        image,
        provenance,
        input_size: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::DirectRequest;
    use crate::storage::{MemoryStore, StorageError};
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn direct(source: DirectSource) -> Invocation {
        Invocation::Direct(DirectRequest {
            source,
            operation: None,
        })
    }

    #[test]
    fn test_resolve_event_reads_store() {
        let store = MemoryStore::new();
        let loc = StorageLocation::new("b", "input/a.png");
        store.insert(loc.clone(), png_bytes(4, 3), "image/png");

        let resolved = resolve(&Invocation::EventTriggered(loc.clone()), &store).unwrap();
        assert_eq!((resolved.image.width, resolved.image.height), (4, 3));
        assert_eq!(resolved.provenance, Provenance::Storage(loc));
    }

    #[test]
    fn test_resolve_payload() {
        let store = MemoryStore::new();
        let data = STANDARD.encode(png_bytes(5, 2));

        let resolved = resolve(&direct(DirectSource::Payload(data)), &store).unwrap();
        assert_eq!(resolved.provenance, Provenance::Payload);
        assert_eq!(resolved.image.width, 5);
    }

    #[test]
    fn test_bad_base64_is_decode_error() {
        let store = MemoryStore::new();
        let err = resolve(&direct(DirectSource::Payload("not base64!!".into())), &store).unwrap_err();
        assert_eq!(err.kind(), "DecodeError");
    }

    #[test]
    fn test_non_image_bytes_is_decode_error() {
        let store = MemoryStore::new();
        let data = STANDARD.encode(b"plain text, not an image");
        let err = resolve(&direct(DirectSource::Payload(data)), &store).unwrap_err();
        assert!(matches!(err, HandlerError::Decode(_)));
    }

    #[test]
    fn test_missing_object_is_storage_error() {
        let store = MemoryStore::new();
        let loc = StorageLocation::new("b", "stage1/gone.jpg");
        let err = resolve(&direct(DirectSource::Storage(loc)), &store).unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_provenance_of_invocation() {
        let loc = StorageLocation::new("b", "stage2/x.jpg");
        assert_eq!(
            Provenance::of(&Invocation::EventTriggered(loc.clone())),
            Provenance::Storage(loc.clone())
        );
        assert_eq!(
            Provenance::of(&direct(DirectSource::Storage(loc.clone()))),
            Provenance::Storage(loc)
        );
        assert_eq!(
            Provenance::of(&direct(DirectSource::Payload("AAAA".into()))),
            Provenance::Payload
        );
    }

    #[test]
    fn test_provenance_record() {
        let mut inspector = Inspector::start_with_env(|_| None);
        Provenance::Storage(StorageLocation::new("b", "k")).record(&mut inspector);
        let record = inspector.finish();
        assert_eq!(record["input_source"], "storage");
        assert_eq!(record["s3_bucket"], "b");
        assert_eq!(record["s3_key"], "k");
    }
}
