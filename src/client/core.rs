//! Client entry point.
//!
//! The [`Client`] owns the connection to the remote engine and hands out
//! context and page handles bound to it.
//!
//! # Example
//!
//! ```no_run
//! use conduit_driver::Client;
//!
//! # fn example() -> conduit_driver::Result<()> {
//! let client = Client::builder()
//!     .websocket("ws://127.0.0.1:9222/engine")
//!     .build()?;
//!
//! let context = client.new_context()?;
//! let page = context.new_page()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde_json::json;
use tracing::info;

use crate::browser::{BrowserContext, Page};
use crate::error::{Error, Result};
use crate::identifiers::ObjectId;
use crate::transport::Connection;

use super::builder::ClientBuilder;
use super::options::TimeoutSettings;

// ============================================================================
// Client
// ============================================================================

/// Connection owner and handle factory.
#[derive(Clone)]
pub struct Client {
    /// Shared connection.
    connection: Connection,
    /// Root of the timeout chain.
    timeouts: TimeoutSettings,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Public API
// ============================================================================

impl Client {
    /// Creates a configuration builder for the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Wraps an existing connection.
    #[must_use]
    pub fn new(connection: Connection) -> Self {
        let timeouts = TimeoutSettings::new(connection.options().timeout);
        info!("Client ready");
        Self {
            connection,
            timeouts,
        }
    }

    /// Returns the connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Overrides the default timeout for every handle created afterwards
    /// and every handle without its own default.
    pub fn set_default_timeout(&self, timeout: Duration) {
        self.timeouts.set_default_timeout(timeout);
    }

    /// Asks the remote end for a new browser context.
    ///
    /// # Errors
    ///
    /// - errors from sending the request
    /// - [`Error::Protocol`] if the reply carries no context guid
    pub fn new_context(&self) -> Result<BrowserContext> {
        let reply = self
            .connection
            .send_message(&ObjectId::root(), "newContext", json!({}))?;
        let guid = reply
            .get("context")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::protocol("No context guid in newContext reply"))?;

        Ok(self.attach_context(ObjectId::new(guid)))
    }

    /// Binds a handle to an existing remote context.
    #[must_use]
    pub fn attach_context(&self, guid: ObjectId) -> BrowserContext {
        BrowserContext::attach(self.connection.clone(), guid, &self.timeouts)
    }

    /// Binds a handle to an existing remote page.
    ///
    /// Pass the page's context to give its routes a fallback.
    #[must_use]
    pub fn attach_page(&self, guid: ObjectId, context: Option<&BrowserContext>) -> Page {
        match context {
            Some(context) => context.attach_page(guid),
            None => Page::attach(self.connection.clone(), guid, None, &self.timeouts),
        }
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns the transport error if closing failed.
    pub fn close(&self) -> Result<()> {
        info!("Closing client");
        self.connection.close()
    }
}

// ============================================================================
// Tests
// ============================================================================
