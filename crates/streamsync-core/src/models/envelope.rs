//! Provider response envelope
//!
//! Every provider endpoint answers with `{success, errors, messages, result}`.
//! Some endpoints (tus HEAD probes, empty DELETE answers) carry no body at all;
//! those are represented with `EnvelopeOrigin::HeadersOnly` so callers can tell
//! a decoded answer from the permissive fallback.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Where the envelope's content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeOrigin {
    /// Decoded from a JSON response body
    Json,
    /// Body was empty or not JSON; content was synthesized locally
    HeadersOnly,
}

/// A single error entry reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<JsonValue>,
}

impl ProviderError {
    fn render(&self) -> String {
        let code = match &self.code {
            Some(JsonValue::String(code)) => code.clone(),
            Some(JsonValue::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        format!(
            "{} [Code: {}]",
            self.message.as_deref().unwrap_or("Unknown error"),
            code
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub errors: Vec<ProviderError>,
    pub messages: Vec<JsonValue>,
    pub result: JsonValue,
    pub http_status: u16,
    pub origin: EnvelopeOrigin,
}

impl ResponseEnvelope {
    /// Decode a provider response body
    ///
    /// A body that is not valid JSON yields a successful, empty envelope that
    /// keeps the HTTP status. `success` is otherwise taken verbatim from the
    /// payload and the list fields default to empty.
    pub fn parse(http_status: u16, body: &[u8]) -> Self {
        let payload: JsonValue = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(_) => return Self::headers_only(http_status, true, json!({})),
        };

        let success = payload
            .get("success")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);

        let errors = payload
            .get("errors")
            .and_then(JsonValue::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| {
                        serde_json::from_value::<ProviderError>(entry.clone()).unwrap_or(
                            ProviderError {
                                message: entry.as_str().map(str::to_string),
                                code: None,
                            },
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        let messages = payload
            .get("messages")
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default();

        let result = match payload.get("result") {
            Some(JsonValue::Null) | None => json!({}),
            Some(result) => result.clone(),
        };

        Self {
            success,
            errors,
            messages,
            result,
            http_status,
            origin: EnvelopeOrigin::Json,
        }
    }

    /// Build an envelope for an answer whose outcome is carried in headers only
    pub fn headers_only(http_status: u16, success: bool, result: JsonValue) -> Self {
        Self {
            success,
            errors: Vec::new(),
            messages: Vec::new(),
            result,
            http_status,
            origin: EnvelopeOrigin::HeadersOnly,
        }
    }

    /// Treat a 404 as a failure even when the body could not be decoded
    pub fn reject_not_found(mut self) -> Self {
        if self.http_status == 404 {
            self.success = false;
        }
        self
    }

    /// Treat a non-2xx answer without a decodable body as a failure
    ///
    /// The permissive fallback exists for body-less success answers. An error
    /// page from an intermediary must not pass for a successful lookup.
    pub fn reject_error_status(mut self) -> Self {
        if self.is_headers_only() && !(200..300).contains(&self.http_status) {
            self.success = false;
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The provider or an intermediary failed; says nothing about the video
    pub fn is_server_error(&self) -> bool {
        self.http_status >= 500
    }

    pub fn is_headers_only(&self) -> bool {
        self.origin == EnvelopeOrigin::HeadersOnly
    }

    /// Remote video id reported in `result.uid`, if any
    pub fn uid(&self) -> Option<&str> {
        self.result
            .get("uid")
            .and_then(JsonValue::as_str)
            .filter(|uid| !uid.is_empty())
    }

    /// Error information for log messages and operator output
    pub fn error_information(&self) -> String {
        let errors = self
            .errors
            .iter()
            .map(ProviderError::render)
            .collect::<Vec<_>>()
            .join(",");
        format!("StatusCode: {}. Provider errors: {}", self.http_status, errors)
    }
}
