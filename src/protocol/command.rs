//! Command definitions organized by target.
//!
//! Commands serialize as `{"method": ..., "params": {...}}` and are
//! flattened into a [`Request`](super::Request) frame.
//!
//! | Target | Commands |
//! |--------|----------|
//! | page / context | `setNetworkInterceptionPatterns` |
//! | route | `continue`, `fulfill`, `abort` |
//! | any | [`CustomCommand`] |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands.
///
/// This enum wraps target-specific command enums for unified serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// Network interception commands (sent to a page or context).
    Network(NetworkCommand),
    /// Route decision commands (sent to a route object).
    Route(RouteCommand),
    /// Any other method with free-form params.
    Custom(CustomCommand),
}

impl Command {
    /// Returns the protocol method name.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Network(NetworkCommand::SetNetworkInterceptionPatterns { .. }) => {
                "setNetworkInterceptionPatterns"
            }
            Self::Route(RouteCommand::Continue { .. }) => "continue",
            Self::Route(RouteCommand::Fulfill { .. }) => "fulfill",
            Self::Route(RouteCommand::Abort { .. }) => "abort",
            Self::Custom(custom) => &custom.method,
        }
    }
}

impl From<NetworkCommand> for Command {
    fn from(command: NetworkCommand) -> Self {
        Self::Network(command)
    }
}

impl From<RouteCommand> for Command {
    fn from(command: RouteCommand) -> Self {
        Self::Route(command)
    }
}

impl From<CustomCommand> for Command {
    fn from(command: CustomCommand) -> Self {
        Self::Custom(command)
    }
}

// ============================================================================
// Network Commands
// ============================================================================

/// Network commands for request interception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum NetworkCommand {
    /// Replace the set of URL patterns the remote end intercepts.
    ///
    /// An empty list disables interception.
    #[serde(rename = "setNetworkInterceptionPatterns")]
    SetNetworkInterceptionPatterns {
        /// Patterns to intercept.
        patterns: Vec<InterceptionPattern>,
    },
}

// ============================================================================
// Route Commands
// ============================================================================

/// Decisions for one intercepted request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum RouteCommand {
    /// Let the request proceed, optionally modified.
    #[serde(rename = "continue")]
    Continue {
        /// Override URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        /// Override HTTP method.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        /// Override headers.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<Vec<Header>>,
        /// Override post data (base64).
        #[serde(default, rename = "postData", skip_serializing_if = "Option::is_none")]
        post_data: Option<String>,
        /// Set when no handler took ownership of the request.
        #[serde(default, rename = "isFallback")]
        is_fallback: bool,
    },

    /// Answer the request locally.
    #[serde(rename = "fulfill")]
    Fulfill {
        /// HTTP status code.
        status: u16,
        /// Response headers.
        #[serde(default)]
        headers: Vec<Header>,
        /// Response body.
        #[serde(default)]
        body: String,
        /// Whether `body` is base64 encoded.
        #[serde(default, rename = "isBase64")]
        is_base64: bool,
    },

    /// Fail the request.
    #[serde(rename = "abort")]
    Abort {
        /// Network error code (e.g. `failed`, `aborted`).
        #[serde(rename = "errorCode")]
        error_code: String,
    },
}

// ============================================================================
// Custom Command
// ============================================================================

/// Free-form command for methods without a typed definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCommand {
    /// Method name.
    pub method: String,
    /// Method params.
    #[serde(default)]
    pub params: Value,
}

impl CustomCommand {
    /// Creates a custom command.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

// ============================================================================
// Header
// ============================================================================

/// HTTP header name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name.
    pub name: String,
    /// Header value.
    pub value: String,
}

impl Header {
    /// Creates a header.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// InterceptionPattern
// ============================================================================

/// URL pattern published to the remote end.
///
/// Exactly one of `glob` or `regex_source` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptionPattern {
    /// Glob pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,
    /// Regular expression source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_source: Option<String>,
    /// Regular expression flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_flags: Option<String>,
}

impl InterceptionPattern {
    /// Glob that matches every URL.
    pub const MATCH_ALL_GLOB: &'static str = "**/*";

    /// Creates a glob pattern.
    #[inline]
    #[must_use]
    pub fn glob(glob: impl Into<String>) -> Self {
        Self {
            glob: Some(glob.into()),
            regex_source: None,
            regex_flags: None,
        }
    }

    /// Creates a regex pattern.
    #[inline]
    #[must_use]
    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            glob: None,
            regex_source: Some(source.into()),
            regex_flags: Some(flags.into()),
        }
    }

    /// Creates the wildcard pattern.
    #[inline]
    #[must_use]
    pub fn match_all() -> Self {
        Self::glob(Self::MATCH_ALL_GLOB)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_set_interception_patterns() {
        let cmd = NetworkCommand::SetNetworkInterceptionPatterns {
            patterns: vec![
                InterceptionPattern::glob("**/*.png"),
                InterceptionPattern::regex("api/v\\d", "i"),
            ],
        };
        let value = serde_json::to_value(&cmd).expect("serialize");
        assert_eq!(
            value,
            json!({
                "method": "setNetworkInterceptionPatterns",
                "params": {
                    "patterns": [
                        { "glob": "**/*.png" },
                        { "regexSource": "api/v\\d", "regexFlags": "i" }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_continue_skips_empty_overrides() {
        let cmd = RouteCommand::Continue {
            url: None,
            method: None,
            headers: None,
            post_data: None,
            is_fallback: true,
        };
        let value = serde_json::to_value(&cmd).expect("serialize");
        assert_eq!(
            value,
            json!({ "method": "continue", "params": { "isFallback": true } })
        );
    }

    #[test]
    fn test_abort() {
        let cmd = RouteCommand::Abort {
            error_code: "blockedbyclient".to_string(),
        };
        let json = serde_json::to_string(&cmd).expect("serialize");
        assert!(json.contains("\"abort\""));
        assert!(json.contains("errorCode"));
    }

    #[test]
    fn test_command_method() {
        let cmd: Command = RouteCommand::Fulfill {
            status: 204,
            headers: Vec::new(),
            body: String::new(),
            is_base64: false,
        }
        .into();
        assert_eq!(cmd.method(), "fulfill");

        let custom = Command::Custom(CustomCommand::new("goto", json!({"url": "about:blank"})));
        assert_eq!(custom.method(), "goto");
    }

    #[test]
    fn test_command_roundtrip_prefers_typed_variant() {
        let value = json!({ "method": "abort", "params": { "errorCode": "failed" } });
        let cmd: Command = serde_json::from_value(value).expect("deserialize");
        assert!(matches!(cmd, Command::Route(RouteCommand::Abort { .. })));
    }
}
