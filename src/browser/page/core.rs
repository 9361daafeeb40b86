//! Core Page struct and accessors.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::client::TimeoutSettings;
use crate::error::Result;
use crate::identifiers::{ListenerId, ObjectId};
use crate::protocol::names;
use crate::transport::Connection;

use crate::browser::BrowserContext;
use crate::browser::target::Target;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a page.
pub(crate) struct PageInner {
    /// Routes, events and lifetime.
    pub target: Target,
    /// Owning context (optional for standalone page references).
    pub context: Option<BrowserContext>,
}

// ============================================================================
// Page
// ============================================================================

/// A handle to a remote page.
///
/// Pages route intercepted requests through their own handlers first and
/// then through their context's.
#[derive(Clone)]
pub struct Page {
    pub(crate) inner: Arc<PageInner>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("guid", self.guid())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Binds a page handle to a remote page object.
    ///
    /// Timeouts default to the context's when there is one, otherwise to
    /// `timeouts`.
    pub(crate) fn attach(
        connection: Connection,
        guid: ObjectId,
        context: Option<BrowserContext>,
        timeouts: &TimeoutSettings,
    ) -> Self {
        let parent_timeouts = context
            .as_ref()
            .map_or(timeouts, |context| context.inner.target.timeouts());
        let timeouts = TimeoutSettings::child_of(parent_timeouts);

        let target = Target::new("page", guid, connection, timeouts, true);
        let inner = Arc::new(PageInner { target, context });

        let weak: Weak<PageInner> = Arc::downgrade(&inner);
        inner.target.listeners().add(names::ROUTE, move |params| {
            let Some(page) = weak.upgrade() else {
                return Ok(());
            };
            let parent = page.context.as_ref().map(|context| &context.inner.target);
            page.target.dispatch_route(params, parent)
        });

        debug!(guid = %inner.target.guid(), "Page attached");
        Self { inner }
    }
}

// ============================================================================
// Page - Accessors
// ============================================================================

impl Page {
    /// Returns the page guid.
    #[inline]
    #[must_use]
    pub fn guid(&self) -> &ObjectId {
        self.inner.target.guid()
    }

    /// Returns the owning context, if any.
    #[inline]
    #[must_use]
    pub fn context(&self) -> Option<&BrowserContext> {
        self.inner.context.as_ref()
    }

    /// Returns the connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        self.inner.target.connection()
    }

    /// Returns `true` once the page emitted `close`.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.target.is_closed()
    }

    /// Returns `true` once the page emitted `crash`.
    #[inline]
    #[must_use]
    pub fn is_crashed(&self) -> bool {
        self.inner.target.is_crashed()
    }

    /// Sets the default timeout for waits on this page.
    ///
    /// Zero waits indefinitely.
    pub fn set_default_timeout(&self, timeout: Duration) {
        self.inner.target.timeouts().set_default_timeout(timeout);
    }
}

// ============================================================================
// Page - Events & Commands
// ============================================================================

impl Page {
    /// Subscribes to a page event.
    ///
    /// The listener runs on whichever thread is pumping the connection.
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
    {
        self.inner.target.listeners().add(event, listener)
    }

    /// Removes a subscription. Returns `false` if it was not registered.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.inner.target.listeners().remove(event, id)
    }

    /// Sends a request to the page object and waits for the reply.
    ///
    /// # Errors
    ///
    /// See [`Connection::send_message`].
    pub fn send(&self, method: &str, params: Value) -> Result<Value> {
        self.connection().send_message(self.guid(), method, params)
    }

    /// Asks the remote end to close the page.
    ///
    /// # Errors
    ///
    /// Returns errors from sending the request.
    pub fn close(&self) -> Result<()> {
        if self.is_closed() {
            warn!(guid = %self.guid(), "Page already closed");
            return Ok(());
        }
        self.send("close", Value::Object(Default::default()))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
