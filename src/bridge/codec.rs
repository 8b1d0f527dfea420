//! Wire documents exchanged through the mailbox slots.
//!
//! Both slots hold a single JSON object. A command document carries the
//! envelope keys `operation` and `correlation_id` with the payload keys
//! flattened beside them:
//!
//! ```json
//! {
//!   "operation": "DELETE_CAR",
//!   "correlation_id": "9a3c...",
//!   "carName": "Honda City"
//! }
//! ```
//!
//! A result document echoes the identifier and reports a status:
//!
//! ```json
//! { "correlation_id": "9a3c...", "status": "success", "data": [ ... ] }
//! { "correlation_id": "9a3c...", "status": "error", "message": "..." }
//! ```
//!
//! Older workers write `id` and read `action`. When decoding, those keys stand
//! in for the canonical ones only if the canonical key is absent; otherwise
//! they are ordinary fields. Encoding always uses the canonical names.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{BridgeError, BridgeResult};

/// Literal stored in a slot that holds no document.
pub const EMPTY_DOCUMENT: &str = "{}";

/// Loosely-typed operation payload.
pub type Payload = serde_json::Map<String, Value>;

/// Keys owned by the envelope that a payload may not reuse.
const RESERVED_KEYS: [&str; 2] = ["operation", "correlation_id"];

/// Legacy spellings of the envelope keys, as `(canonical, legacy)`.
const LEGACY_REQUEST_KEYS: [(&str, &str); 2] = [("operation", "action"), ("correlation_id", "id")];
const LEGACY_RESPONSE_KEYS: [(&str, &str); 1] = [("correlation_id", "id")];

// ============================================================================
// Request/Response
// ============================================================================

/// Request written to the command slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Action the worker should perform (e.g. `GET_ALL_CARS`).
    pub operation: String,
    /// Unique identifier echoed back in the matching response.
    pub correlation_id: String,
    /// Operation-specific fields.
    #[serde(flatten)]
    pub payload: Payload,
}

impl Request {
    pub fn new(
        operation: impl Into<String>,
        correlation_id: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            operation: operation.into(),
            correlation_id: correlation_id.into(),
            payload,
        }
    }

    /// Look up a string payload field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Look up a numeric payload field.
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.payload.get(key).and_then(Value::as_f64)
    }

    /// Look up a boolean payload field.
    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.payload.get(key).and_then(Value::as_bool)
    }
}

/// Outcome reported by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Response read from the result slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Identifier of the request this answers.
    pub correlation_id: String,
    pub status: Status,
    /// Result data (present on success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Diagnostic text (typically present on error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    /// Successful response with optional data.
    pub fn success(correlation_id: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            status: Status::Success,
            data,
            message: None,
        }
    }

    /// Error response with a message.
    pub fn error(correlation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            status: Status::Error,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Attach a message to a response.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Result of reading a slot's contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The slot holds the empty document.
    Empty,
    /// The text is not (yet) a complete response document.
    Incomplete,
    /// A complete response.
    Ready(Response),
}

// ============================================================================
// Encoding / Decoding
// ============================================================================

/// Serialize a request for the command slot.
pub fn encode(request: &Request) -> BridgeResult<String> {
    if let Some(key) = RESERVED_KEYS
        .iter()
        .find(|key| request.payload.contains_key(**key))
    {
        return Err(BridgeError::InvalidPayload((*key).to_string()));
    }
    serde_json::to_string_pretty(request).map_err(BridgeError::Encode)
}

/// Parse the result slot's contents.
///
/// Never fails: anything short of a complete response document is reported
/// as [`Decoded::Empty`] or [`Decoded::Incomplete`], since the worker may
/// still be writing.
pub fn decode(document: &str) -> Decoded {
    let trimmed = document.trim();
    if is_empty_document(trimmed) {
        return Decoded::Empty;
    }
    match parse_envelope(trimmed, &LEGACY_RESPONSE_KEYS) {
        Some(response) => Decoded::Ready(response),
        None => Decoded::Incomplete,
    }
}

/// Parse the command slot's contents on the worker side.
pub fn decode_request(document: &str) -> Option<Request> {
    let trimmed = document.trim();
    if is_empty_document(trimmed) {
        return None;
    }
    parse_envelope(trimmed, &LEGACY_REQUEST_KEYS)
}

/// Serialize a response for the result slot.
pub fn encode_response(response: &Response) -> BridgeResult<String> {
    serde_json::to_string_pretty(response).map_err(BridgeError::Encode)
}

/// Serialize a value that must be a JSON object into a payload.
pub fn to_payload<T: Serialize>(value: &T) -> BridgeResult<Payload> {
    match serde_json::to_value(value).map_err(BridgeError::Encode)? {
        Value::Object(map) => Ok(map),
        other => Err(BridgeError::InvalidPayload(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Parse an object, filling absent canonical keys from their legacy spelling.
///
/// A legacy key next to its canonical one is left alone, so it reaches the
/// payload (requests) or is ignored (responses).
fn parse_envelope<T: DeserializeOwned>(document: &str, legacy: &[(&str, &str)]) -> Option<T> {
    let mut map: Payload = serde_json::from_str(document).ok()?;
    for (canonical, old) in legacy {
        if !map.contains_key(*canonical) {
            if let Some(value) = map.remove(*old) {
                map.insert((*canonical).to_string(), value);
            }
        }
    }
    serde_json::from_value(Value::Object(map)).ok()
}

fn is_empty_document(trimmed: &str) -> bool {
    trimmed.is_empty() || trimmed == EMPTY_DOCUMENT
}
