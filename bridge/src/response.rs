//! Response codec: raw [`ExecuteResponse`] to a caller-facing view.
//!
//! The return value is reinterpreted as JSON when it parses. When it does not,
//! the raw string is used as-is; the parse failure never reaches the caller.

use serde::Serialize;
use serde_json::Value;
use zone_types::{ExecuteResponse, ResponseCode};

/// A read-only projection of an [`ExecuteResponse`] with its return value decoded.
///
/// Serialized, the decoded view takes the place of `returnValue`. The raw
/// string stays available through [`raw_return_value`](Self::raw_return_value).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedResponse {
    pub code: ResponseCode,
    pub error_message: String,
    /// Parsed `returnValue`, or the raw string when it is not valid JSON.
    pub return_value: Value,
    #[serde(skip)]
    raw_return_value: String,
}

impl DecodedResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// The scheduler's `returnValue` exactly as received.
    #[must_use]
    pub fn raw_return_value(&self) -> &str {
        &self.raw_return_value
    }

    /// Render as the embedding runtime's native object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "code": self.code.value(),
            "errorMessage": self.error_message,
            "returnValue": self.return_value,
        })
    }
}

/// Decode with the default JSON parser.
#[must_use]
pub fn decode(raw: &ExecuteResponse) -> DecodedResponse {
    decode_with(raw, |text| serde_json::from_str(text).ok())
}

/// Decode with a caller-supplied parser.
///
/// `parse` is not called for an empty return value.
pub fn decode_with<P>(raw: &ExecuteResponse, parse: P) -> DecodedResponse
where
    P: FnOnce(&str) -> Option<Value>,
{
    let return_value = if raw.return_value.is_empty() {
        Value::String(String::new())
    } else {
        parse(&raw.return_value).unwrap_or_else(|| Value::String(raw.return_value.clone()))
    };

    DecodedResponse {
        code: raw.code,
        error_message: raw.error_message.clone(),
        return_value,
        raw_return_value: raw.return_value.clone(),
    }
}
