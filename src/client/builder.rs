//! Builder pattern for client configuration.
//!
//! Provides a fluent API for configuring and creating [`Client`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use conduit_driver::Client;
//!
//! # fn example() -> conduit_driver::Result<()> {
//! let client = Client::builder()
//!     .websocket("ws://127.0.0.1:9222/engine")
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::transport::{Connection, Transport};

use super::core::Client;
use super::options::ClientOptions;

// ============================================================================
// Endpoint
// ============================================================================

/// Where the client connects.
enum Endpoint {
    /// WebSocket URL.
    WebSocket(String),
    /// Caller-provided transport.
    Transport(Box<dyn Transport>),
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebSocket(url) => f.debug_tuple("WebSocket").field(url).finish(),
            Self::Transport(_) => f.write_str("Transport(..)"),
        }
    }
}

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`Client`] instance.
///
/// Use [`Client::builder()`] to create a new builder.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    /// Connection endpoint.
    endpoint: Option<Endpoint>,
    /// Configuration.
    options: ClientOptions,
    /// Raw base URL, parsed on build.
    base_url: Option<String>,
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a new client builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects to a WebSocket endpoint on build.
    ///
    /// # Arguments
    ///
    /// * `url` - Endpoint URL (e.g., "ws://127.0.0.1:9222/engine")
    #[inline]
    #[must_use]
    pub fn websocket(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(Endpoint::WebSocket(url.into()));
        self
    }

    /// Uses an already established transport.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.endpoint = Some(Endpoint::Transport(Box::new(transport)));
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the default timeout. Zero waits indefinitely.
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Sets the predicate poll interval.
    #[inline]
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Sets the pending request cap.
    #[inline]
    #[must_use]
    pub fn max_pending_requests(mut self, max: usize) -> Self {
        self.options.max_pending_requests = max;
        self
    }

    /// Sets the base URL for relative route globs.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL (e.g., "https://example.com/app/")
    #[inline]
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no endpoint is set or an option is invalid
    /// - [`Error::Connection`] if the WebSocket handshake fails
    pub fn build(self) -> Result<Client> {
        let options = self.validate_options()?;
        let endpoint = self.endpoint.ok_or_else(|| {
            Error::config(
                "An endpoint is required. Use .websocket() or .transport() to set it.\n\
                 Example: Client::builder().websocket(\"ws://127.0.0.1:9222/engine\")",
            )
        })?;

        let connection = match endpoint {
            Endpoint::WebSocket(url) => Connection::connect(&url, options)?,
            Endpoint::Transport(transport) => Connection::from_transport(transport, options)?,
        };

        Ok(Client::new(connection))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    /// Validates options and resolves the base URL.
    fn validate_options(&self) -> Result<ClientOptions> {
        let mut options = self.options.clone();

        if let Some(raw) = &self.base_url {
            let url = Url::parse(raw)
                .map_err(|e| Error::config(format!("Invalid base URL \"{raw}\": {e}")))?;
            options.base_url = Some(url);
        }

        options.validate().map_err(Error::config)?;
        Ok(options)
    }
}

// ============================================================================
// Tests
// ============================================================================
