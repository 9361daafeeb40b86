//! Router bound to a remote object.
//!
//! Pages and contexts each own one [`Interception`]: their router plus the
//! pattern set last published to the remote end. Patterns are republished
//! only when the set changes.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::identifiers::ObjectId;
use crate::protocol::{InterceptionPattern, NetworkCommand};
use crate::transport::Connection;

use super::matcher::UrlMatcher;
use super::route::Route;
use super::router::{HandleResult, RouteHandler, Router};

// ============================================================================
// Interception
// ============================================================================

/// Router plus published pattern state of one remote object.
#[derive(Debug)]
pub struct Interception {
    guid: ObjectId,
    connection: Connection,
    router: Router,
    published: Mutex<Vec<InterceptionPattern>>,
}

impl Interception {
    /// Creates an interception with no rules and nothing published.
    #[must_use]
    pub fn new(guid: ObjectId, connection: Connection) -> Self {
        Self {
            guid,
            connection,
            router: Router::new(),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Returns the router.
    #[inline]
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the pattern set last published.
    #[must_use]
    pub fn published(&self) -> Vec<InterceptionPattern> {
        self.published.lock().clone()
    }

    /// Adds a rule and republishes patterns.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`](crate::Error::InvalidArgument) if `times` is zero
    /// - errors from publishing
    pub fn route(
        &self,
        matcher: UrlMatcher,
        handler: RouteHandler,
        times: Option<usize>,
    ) -> Result<()> {
        self.router.add(matcher, handler, times)?;
        self.sync_patterns()
    }

    /// Removes rules and republishes patterns.
    ///
    /// # Errors
    ///
    /// Returns errors from publishing.
    pub fn unroute(&self, matcher: &UrlMatcher, handler: Option<&RouteHandler>) -> Result<()> {
        self.router.remove(matcher, handler);
        self.sync_patterns()
    }

    /// Removes every rule and disables interception.
    ///
    /// # Errors
    ///
    /// Returns errors from publishing.
    pub fn unroute_all(&self) -> Result<()> {
        self.router.clear();
        self.sync_patterns()
    }

    /// Routes one request, then republishes patterns if rules expired.
    ///
    /// # Errors
    ///
    /// Returns handler errors and errors from publishing.
    pub fn handle(&self, route: &Route) -> Result<HandleResult> {
        let result = self.router.handle(route)?;
        self.sync_patterns()?;
        Ok(result)
    }

    /// Publishes the router's pattern set if it changed.
    ///
    /// # Errors
    ///
    /// Returns errors from sending the command.
    pub fn sync_patterns(&self) -> Result<()> {
        let patterns = self.router.interception_patterns();
        if *self.published.lock() == patterns {
            return Ok(());
        }

        debug!(guid = %self.guid, count = patterns.len(), "Publishing interception patterns");
        let command = NetworkCommand::SetNetworkInterceptionPatterns {
            patterns: patterns.clone(),
        };
        self.connection.send_command(&self.guid, command)?;

        *self.published.lock() = patterns;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
