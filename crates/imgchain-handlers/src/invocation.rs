//! Invocation classification.
//!
//! Every stage accepts two payload shapes: a storage "new object"
//! notification envelope, or a flat direct-call mapping. The shape is decided
//! once, here, before any image work happens.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::HandlerError;
use crate::storage::StorageLocation;

pub const MISSING_SOURCE_MESSAGE: &str =
    "Missing required fields: either 'image_data' or ('s3_bucket' and 's3_key')";

/// How a stage was invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// A storage notification for a newly written object.
    EventTriggered(StorageLocation),
    /// A synchronous call that expects the result inline.
    Direct(DirectRequest),
}

impl Invocation {
    pub fn is_event(&self) -> bool {
        matches!(self, Invocation::EventTriggered(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectRequest {
    pub source: DirectSource,
    /// Caller's label for the operation; reporting only.
    pub operation: Option<String>,
}

/// Where a direct call's image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectSource {
    /// Base64-encoded image bytes carried in the request.
    Payload(String),
    /// An object to read from storage.
    Storage(StorageLocation),
}

#[derive(Debug, Deserialize)]
struct NotificationEnvelope {
    #[serde(rename = "Records")]
    records: Vec<NotificationRecord>,
}

#[derive(Debug, Deserialize)]
struct NotificationRecord {
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: BucketEntity,
    object: ObjectEntity,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: String,
}

/// Classify a raw invocation payload.
///
/// A mapping is a notification only when its `Records` list parses as one.
/// Anything else is read as a direct call. If no image source can be found
/// either, the result is `UnsupportedInvocation` when the payload carried a
/// broken `Records` entry, and a `Validation` error otherwise, which callers
/// report through the direct failure path. Non-objects are always
/// `UnsupportedInvocation`.
pub fn classify(event: &Value) -> Result<Invocation, HandlerError> {
    let Some(fields) = event.as_object() else {
        return Err(HandlerError::UnsupportedInvocation(format!(
            "expected a JSON object, got {}",
            json_type(event)
        )));
    };

    let broken_records = match parse_notification(fields.get("Records"), event) {
        Ok(Some(location)) => return Ok(Invocation::EventTriggered(location)),
        Ok(None) => None,
        Err(reason) => Some(reason),
    };

    match direct_request(fields) {
        Ok(request) => {
            if let Some(reason) = broken_records {
                log::debug!("ignoring 'Records' on direct invocation: {reason}");
            }
            Ok(Invocation::Direct(request))
        }
        Err(err) => match broken_records {
            Some(reason) => Err(HandlerError::UnsupportedInvocation(reason)),
            None => Err(err),
        },
    }
}

/// `Ok(None)` when there is no notification to read, `Err` when `Records`
/// is present but is not a notification.
fn parse_notification(
    records: Option<&Value>,
    event: &Value,
) -> Result<Option<StorageLocation>, String> {
    match records {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(list)) if list.is_empty() => return Ok(None),
        Some(Value::Array(_)) => {}
        Some(other) => return Err(format!("'Records' must be a list, got {}", json_type(other))),
    }

    let envelope = NotificationEnvelope::deserialize(event)
        .map_err(|e| format!("malformed storage notification: {e}"))?;

    let mut records = envelope.records.into_iter();
    let Some(first) = records.next() else {
        return Ok(None);
    };
    for extra in records {
        log::debug!(
            "ignoring extra notification record for {}/{}",
            extra.s3.bucket.name,
            extra.s3.object.key
        );
    }

    Ok(Some(StorageLocation::new(
        first.s3.bucket.name,
        decode_key(&first.s3.object.key),
    )))
}

/// Read the direct-call fields. The payload wins, so the storage fields are
/// only checked when there is no `image_data`.
fn direct_request(fields: &Map<String, Value>) -> Result<DirectRequest, HandlerError> {
    let operation = fields
        .get("operation")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(data) = string_field(fields, "image_data")? {
        return Ok(DirectRequest {
            source: DirectSource::Payload(data),
            operation,
        });
    }

    match (string_field(fields, "s3_bucket")?, string_field(fields, "s3_key")?) {
        (Some(bucket), Some(key)) => Ok(DirectRequest {
            source: DirectSource::Storage(StorageLocation::new(bucket, key)),
            operation,
        }),
        _ => Err(HandlerError::Validation(MISSING_SOURCE_MESSAGE.to_string())),
    }
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Result<Option<String>, HandlerError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(HandlerError::Validation(format!(
            "Invalid direct invocation: '{name}' must be a string, got {}",
            json_type(other)
        ))),
    }
}

/// Operation label from a raw payload, if it carries a string one.
pub fn requested_operation(event: &Value) -> Option<&str> {
    event.get("operation").and_then(Value::as_str)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Decode a notification object key: `+` is a space and `%XX` is a byte.
///
/// Malformed escapes are kept literally. If the decoded bytes are not UTF-8
/// the key is returned as received.
pub fn decode_key(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 2;
                    }
                    _ => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| raw.to_string())
}

/// Encode an object key the way storage notifications present it.
pub fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Build a single-record notification for `location`.
pub fn notification(location: &StorageLocation) -> Value {
    json!({
        "Records": [{
            "eventSource": "aws:s3",
            "eventName": "ObjectCreated:Put",
            "s3": {
                "bucket": { "name": location.bucket },
                "object": { "key": encode_key(&location.key) }
            }
        }]
    })
}
