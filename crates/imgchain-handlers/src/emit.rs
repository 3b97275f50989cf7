//! Output emission: a storage write for chained calls, an inline payload for
//! direct calls.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use imgchain_core::{encode_jpeg, RasterImage, OUTPUT_CONTENT_TYPE};

use crate::error::HandlerError;
use crate::metrics::Inspector;
use crate::resolve::Provenance;
use crate::storage::{ObjectMetadata, ObjectStore, StorageLocation};

/// The encoded output of one stage invocation.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub operation: String,
    pub provenance: Provenance,
    pub width: u32,
    pub height: u32,
}

impl StageResult {
    /// JPEG-encode `image` at `quality`.
    pub fn encode(
        image: &RasterImage,
        operation: impl Into<String>,
        provenance: Provenance,
        quality: u8,
    ) -> Result<Self, HandlerError> {
        let bytes = encode_jpeg(image, quality)?;
        Ok(Self {
            bytes,
            content_type: OUTPUT_CONTENT_TYPE,
            operation: operation.into(),
            provenance,
            width: image.width,
            height: image.height,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn metadata(&self) -> ObjectMetadata {
        ObjectMetadata::for_body(&self.bytes, self.content_type)
    }
}

/// Write `result` to `target` in one put with exact length and content type.
pub fn emit_to_storage(
    result: &StageResult,
    store: &dyn ObjectStore,
    target: &StorageLocation,
) -> Result<(), HandlerError> {
    store.put(target, &result.bytes, &result.metadata())?;
    log::info!(
        "{}: wrote {} ({} bytes, {}x{})",
        result.operation,
        target,
        result.size(),
        result.width,
        result.height
    );
    Ok(())
}

/// Attach the base64 result and its reporting fields to the record.
pub fn emit_inline(result: &StageResult, inspector: &mut Inspector) {
    inspector.add_attribute("operation", result.operation.as_str());
    inspector.add_attribute("output_size", result.size());
    inspector.add_attribute("output_width", result.width);
    inspector.add_attribute("output_height", result.height);
    inspector.add_attribute("success", true);
    inspector.add_attribute("image_data", STANDARD.encode(&result.bytes));
}
