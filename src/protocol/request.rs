//! Request and Response message types.
//!
//! Defines the frames for command requests and their correlated replies.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{ObjectId, RequestId};

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// A command request from local end to remote end.
///
/// # Format
///
/// ```json
/// {
///   "id": 7,
///   "guid": "page@3",
///   "method": "setNetworkInterceptionPatterns",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Correlation ID echoed by the reply.
    pub id: RequestId,

    /// Target object.
    pub guid: ObjectId,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a new request.
    #[inline]
    #[must_use]
    pub fn new(id: RequestId, guid: ObjectId, command: Command) -> Self {
        Self { id, guid, command }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A reply from remote end to local end.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 7, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 7, "error": { "name": "Error", "message": "..." } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error payload (if error).
    #[serde(default)]
    pub error: Option<ErrorPayload>,
}

/// Error payload of a failed reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorPayload {
    /// Error class name reported by the remote end.
    #[serde(default)]
    pub name: Option<String>,

    /// Error message.
    #[serde(default)]
    pub message: String,
}

impl Response {
    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the response carries an error.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            None => Ok(self.result.unwrap_or(Value::Null)),
            Some(error) => {
                let message = match error.name {
                    Some(name) => format!("{name}: {}", error.message),
                    None => error.message,
                };
                Err(Error::protocol(message))
            }
        }
    }

    /// Gets a string value from the result.
    ///
    /// Returns empty string if key not found or not a string.
    #[inline]
    #[must_use]
    pub fn get_string(&self, key: &str) -> String {
        self.result
            .as_ref()
            .and_then(|v| v.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CustomCommand, RouteCommand};

    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let command = Command::Route(RouteCommand::Abort {
            error_code: "failed".to_string(),
        });
        let request = Request::new(RequestId::new(3), ObjectId::new("route@1"), command);
        let value = serde_json::to_value(&request).expect("serialize");

        assert_eq!(
            value,
            json!({
                "id": 3,
                "guid": "route@1",
                "method": "abort",
                "params": { "errorCode": "failed" }
            })
        );
    }

    #[test]
    fn test_custom_request_serialization() {
        let command = Command::Custom(CustomCommand::new("goto", json!({ "url": "https://x/" })));
        let request = Request::new(RequestId::new(1), ObjectId::new("frame@1"), command);
        let json = serde_json::to_string(&request).expect("serialize");

        assert!(json.contains("\"method\":\"goto\""));
        assert!(json.contains("\"guid\":\"frame@1\""));
    }

    #[test]
    fn test_success_response() {
        let response: Response =
            serde_json::from_str(r#"{"id": 9, "result": {"title": "Example"}}"#).expect("parse");
        assert!(response.is_success());
        assert_eq!(response.get_string("title"), "Example");
        assert_eq!(response.get_string("missing"), "");
    }

    #[test]
    fn test_error_response() {
        let response: Response = serde_json::from_str(
            r#"{"id": 9, "error": {"name": "TargetClosedError", "message": "page closed"}}"#,
        )
        .expect("parse");
        assert!(!response.is_success());

        let err = response.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Protocol error: TargetClosedError: page closed"
        );
    }

    #[test]
    fn test_empty_result_is_null() {
        let response: Response = serde_json::from_str(r#"{"id": 1}"#).expect("parse");
        assert_eq!(response.into_result().expect("ok"), Value::Null);
    }
}
