//! Handler error taxonomy.
//!
//! Errors fall into two tiers. `UnsupportedInvocation` is always raised to the
//! host. Everything else is raised for storage-triggered invocations and
//! converted into a failure record for direct invocations and routing.

use imgchain_core::{DecodeError, EncodeError, TransformError};
use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// The invocation payload matches neither a notification nor a direct call.
    #[error("Unsupported invocation: {0}")]
    UnsupportedInvocation(String),

    /// Missing or malformed caller-supplied fields.
    #[error("{0}")]
    Validation(String),

    /// Bad base64 or undecodable image bytes.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Encode failed: {0}")]
    Encode(#[from] EncodeError),
}

impl From<DecodeError> for HandlerError {
    fn from(err: DecodeError) -> Self {
        HandlerError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for HandlerError {
    fn from(err: base64::DecodeError) -> Self {
        HandlerError::Decode(format!("invalid base64 payload: {err}"))
    }
}

impl HandlerError {
    /// Stable name of the error class, reported as `error_type` in failure records.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::UnsupportedInvocation(_) => "UnsupportedInvocation",
            HandlerError::Validation(_) => "ValidationError",
            HandlerError::Decode(_) => "DecodeError",
            HandlerError::Storage(_) => "StorageError",
            HandlerError::Transform(_) => "TransformError",
            HandlerError::Encode(_) => "EncodeError",
        }
    }

    /// Whether a direct invocation may turn this error into a failure record.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, HandlerError::UnsupportedInvocation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_is_not_recoverable() {
        let err = HandlerError::UnsupportedInvocation("expected a JSON object".to_string());
        assert!(!err.is_recoverable());
        assert_eq!(err.kind(), "UnsupportedInvocation");
    }

    #[test]
    fn test_validation_message_is_bare() {
        let err = HandlerError::Validation("Missing required fields".to_string());
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Missing required fields");
    }

    #[test]
    fn test_decode_error_from_core() {
        let err: HandlerError = DecodeError::InvalidFormat.into();
        assert!(matches!(err, HandlerError::Decode(_)));
        assert_eq!(
            err.to_string(),
            "Decode error: Invalid or unsupported image format"
        );
    }

    #[test]
    fn test_storage_error_from() {
        let err: HandlerError = StorageError::NotFound {
            bucket: "b".to_string(),
            key: "input/x.jpg".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "StorageError");
        assert!(err.to_string().contains("b/input/x.jpg"));
    }
}
