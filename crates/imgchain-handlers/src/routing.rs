//! Routing unit: places an uploaded image into its language's bucket under
//! `input/`, which seeds that bucket's pipeline.
//!
//! Routing never raises. Every outcome is a [`RouteResponse`] carrying an
//! HTTP-style status code.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use imgchain_core::OUTPUT_CONTENT_TYPE;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::LanguageBuckets;
use crate::stage::INPUT_PREFIX;
use crate::storage::{ObjectMetadata, ObjectStore, StorageLocation};

pub const UPLOADED_MESSAGE: &str = "Image successfully uploaded";
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: 'language' and 'image'";
pub const INVALID_LANGUAGE_MESSAGE: &str =
    "Invalid language. Must be one of: Python, Java, Javascript";
pub const INVALID_BASE64_MESSAGE: &str = "Invalid base64 encoding for image";

/// Languages with a dedicated pipeline bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Java,
    Javascript,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Java, Language::Javascript];

    /// Lowercase name, as used in generated keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Javascript => "javascript",
        }
    }

    /// Case-insensitive lookup.
    pub fn parse(name: &str) -> Option<Language> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteRequest {
    pub language: Option<String>,
    /// Base64-encoded image.
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl RouteResponse {
    fn uploaded(location: StorageLocation, size: usize) -> Self {
        Self {
            status_code: 200,
            success: true,
            message: UPLOADED_MESSAGE.to_string(),
            bucket: Some(location.bucket),
            key: Some(location.key),
            size: Some(size as u64),
        }
    }

    fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            success: false,
            message: message.into(),
            bucket: None,
            key: None,
            size: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::failure(400, message)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// `input/<language>-image-<epoch millis>-<8 lowercase hex>.jpg`
pub fn generate_key(language: Language, epoch_millis: i64, suffix: u32) -> String {
    format!(
        "{INPUT_PREFIX}{}-image-{epoch_millis}-{suffix:08x}.jpg",
        language.as_str()
    )
}

pub struct RoutingHandler {
    store: Arc<dyn ObjectStore>,
    buckets: LanguageBuckets,
}

impl RoutingHandler {
    pub fn new(store: Arc<dyn ObjectStore>, buckets: LanguageBuckets) -> Self {
        Self { store, buckets }
    }

    /// Route a raw invocation payload.
    pub fn handle(&self, event: &Value) -> RouteResponse {
        match RouteRequest::deserialize(event) {
            Ok(request) => self.route(&request),
            Err(err) => {
                log::warn!("routing: unreadable request: {err}");
                RouteResponse::bad_request(MISSING_FIELDS_MESSAGE)
            }
        }
    }

    pub fn route(&self, request: &RouteRequest) -> RouteResponse {
        let (Some(language), Some(image)) = (&request.language, &request.image) else {
            log::warn!("routing: missing language or image");
            return RouteResponse::bad_request(MISSING_FIELDS_MESSAGE);
        };
        if image.trim().is_empty() {
            log::warn!("routing: empty image payload");
            return RouteResponse::bad_request(MISSING_FIELDS_MESSAGE);
        }

        let Some(language) = Language::parse(language) else {
            log::warn!("routing: invalid language {language:?}");
            return RouteResponse::bad_request(INVALID_LANGUAGE_MESSAGE);
        };

        let bytes = match STANDARD.decode(image.trim()) {
            Ok(bytes) => bytes,
            Err(err) => {
                log::warn!("routing: invalid base64 image: {err}");
                return RouteResponse::bad_request(INVALID_BASE64_MESSAGE);
            }
        };

        let key = generate_key(
            language,
            Utc::now().timestamp_millis(),
            rand::thread_rng().gen(),
        );
        let location = StorageLocation::new(self.buckets.bucket_for(language), key);
        log::info!("routing: uploading {} bytes to {}", bytes.len(), location);

        let metadata = ObjectMetadata::for_body(&bytes, OUTPUT_CONTENT_TYPE);
        match self.store.put(&location, &bytes, &metadata) {
            Ok(()) => RouteResponse::uploaded(location, bytes.len()),
            Err(err) => {
                log::error!("routing: upload to {location} failed: {err}");
                RouteResponse::failure(500, format!("Failed to upload image: {err}"))
            }
        }
    }
}
