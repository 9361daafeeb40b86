//! Error types for conduit-driver.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use conduit_driver::{Error, Result};
//!
//! fn example(page: &Page) -> Result<()> {
//!     let request = page.wait_for_request(UrlMatcher::glob("**/api/*")?, None, || Ok(()))?;
//!     println!("{}", request.url);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::Protocol`] |
//! | Waiting | [`Error::Timeout`], [`Error::TargetClosed`], [`Error::Crashed`], [`Error::InvalidState`] |
//! | Routing | [`Error::UnsupportedMatcher`], [`Error::RouteAlreadyHandled`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Regex`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument.
    ///
    /// Returned when a caller passes an unusable value (bad regex flags,
    /// a zero invocation count, ...).
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport could not be established or failed mid-flight.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The message channel is closed.
    ///
    /// Surfaced exactly once per outstanding wait through the race mechanism.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Protocol violation or error reply from the remote end.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Waiting Errors
    // ========================================================================
    /// A timeout won the race.
    #[error("Timeout {timeout_ms}ms exceeded while {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The target object (page, context) was closed during a wait.
    #[error("Target closed: {target}")]
    TargetClosed {
        /// Description of the closed target.
        target: String,
    },

    /// The target crashed during a wait.
    #[error("Target crashed: {target}")]
    Crashed {
        /// Description of the crashed target.
        target: String,
    },

    /// A primitive was used in a state that does not allow the operation.
    ///
    /// Returned, for example, when reading a waitable that is not done.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the misuse.
        message: String,
    },

    // ========================================================================
    // Routing Errors
    // ========================================================================
    /// A matcher cannot be expressed as a remote interception pattern.
    #[error("Matcher cannot be sent to the remote end: {kind}")]
    UnsupportedMatcher {
        /// Matcher kind.
        kind: &'static str,
    },

    /// A route decision was made twice.
    #[error("Route is already handled: {url}")]
    RouteAlreadyHandled {
        /// URL of the intercepted request.
        url: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Regular expression compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a target closed error.
    #[inline]
    pub fn target_closed(target: impl Into<String>) -> Self {
        Self::TargetClosed {
            target: target.into(),
        }
    }

    /// Creates a crashed error.
    #[inline]
    pub fn crashed(target: impl Into<String>) -> Self {
        Self::Crashed {
            target: target.into(),
        }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates an unsupported matcher error.
    #[inline]
    pub fn unsupported_matcher(kind: &'static str) -> Self {
        Self::UnsupportedMatcher { kind }
    }

    /// Creates a route already handled error.
    #[inline]
    pub fn route_already_handled(url: impl Into<String>) -> Self {
        Self::RouteAlreadyHandled { url: url.into() }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if the wait ended because something went away.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            Self::ConnectionClosed | Self::TargetClosed { .. } | Self::Crashed { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::timeout("waiting for event \"request\"", 1500);
        assert_eq!(
            err.to_string(),
            "Timeout 1500ms exceeded while waiting for event \"request\""
        );
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::timeout("test", 5000);
        let other_err = Error::connection("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_closed() {
        assert!(Error::ConnectionClosed.is_closed());
        assert!(Error::target_closed("page").is_closed());
        assert!(Error::crashed("page").is_closed());
        assert!(!Error::timeout("x", 1).is_closed());
    }

    #[test]
    fn test_is_connection_error() {
        let conn_err = Error::connection("test");
        let closed_err = Error::ConnectionClosed;
        let other_err = Error::config("test");

        assert!(conn_err.is_connection_error());
        assert!(closed_err.is_connection_error());
        assert!(!other_err.is_connection_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::timeout("test", 1000).is_recoverable());
        assert!(!Error::config("test").is_recoverable());
        assert!(!Error::ConnectionClosed.is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_regex_error() {
        let regex_err = regex::Regex::new("(").unwrap_err();
        let err: Error = regex_err.into();
        assert!(matches!(err, Error::Regex(_)));
    }
}
