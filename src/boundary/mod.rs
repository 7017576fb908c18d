//! Boundary response envelope
//!
//! Uniform shape any driving boundary (REST controller, CLI, RPC shim) wraps
//! engine outcomes in. Success carries status 200 and a `data` payload; any
//! engine failure carries status 417 with `error` set to the stable failure
//! kind and `message` to the full failure detail.

use crate::types::LedgerError;
use serde::Serialize;

/// HTTP-style status used for successful outcomes
pub const STATUS_OK: u16 = 200;
/// HTTP-style status used for any engine failure
pub const STATUS_EXPECTATION_FAILED: u16 = 417;

/// Response envelope for boundary operations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "statusCode")]
    pub status_code: u16,

    /// Full failure detail; absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Stable failure kind; absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Operation payload; absent on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ResponseEnvelope {
    /// Successful envelope carrying a payload
    pub fn ok(data: serde_json::Value) -> Self {
        ResponseEnvelope {
            status_code: STATUS_OK,
            message: None,
            error: None,
            data: Some(data),
        }
    }

    /// Failure envelope for an engine error
    pub fn failure(error: &LedgerError) -> Self {
        ResponseEnvelope {
            status_code: STATUS_EXPECTATION_FAILED,
            message: Some(error.to_string()),
            error: Some(error.kind().to_string()),
            data: None,
        }
    }

    /// Wrap an engine outcome
    pub fn from_result<T: Serialize>(result: &Result<T, LedgerError>) -> Self {
        match result {
            Ok(value) => ResponseEnvelope::ok(
                serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
            ),
            Err(error) => ResponseEnvelope::failure(error),
        }
    }
}
