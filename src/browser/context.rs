//! Browser context handle.
//!
//! A context groups pages. Its routes apply to every page in it, after the
//! page's own routes.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::client::TimeoutSettings;
use crate::error::{Error, Result};
use crate::identifiers::{ListenerId, ObjectId};
use crate::network::{RouteHandler, UrlMatcher};
use crate::protocol::names;
use crate::transport::Connection;
use crate::waiting::EventPredicate;

use super::page::Page;
use super::target::Target;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a context.
pub(crate) struct ContextInner {
    /// Routes, events and lifetime.
    pub target: Target,
}

// ============================================================================
// BrowserContext
// ============================================================================

/// A handle to a remote browser context.
#[derive(Clone)]
pub struct BrowserContext {
    pub(crate) inner: Arc<ContextInner>,
}

impl fmt::Debug for BrowserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserContext")
            .field("guid", self.guid())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl BrowserContext {
    /// Binds a context handle to a remote context object.
    pub(crate) fn attach(connection: Connection, guid: ObjectId, timeouts: &TimeoutSettings) -> Self {
        let timeouts = TimeoutSettings::child_of(timeouts);
        let target = Target::new("context", guid, connection, timeouts, false);
        let inner = Arc::new(ContextInner { target });

        // Requests from pages without their own routes arrive here
        let weak: Weak<ContextInner> = Arc::downgrade(&inner);
        inner.target.listeners().add(names::ROUTE, move |params| {
            match weak.upgrade() {
                Some(context) => context.target.dispatch_route(params, None),
                None => Ok(()),
            }
        });

        debug!(guid = %inner.target.guid(), "Context attached");
        Self { inner }
    }
}

// ============================================================================
// BrowserContext - Accessors
// ============================================================================

impl BrowserContext {
    /// Returns the context guid.
    #[inline]
    #[must_use]
    pub fn guid(&self) -> &ObjectId {
        self.inner.target.guid()
    }

    /// Returns the connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        self.inner.target.connection()
    }

    /// Returns `true` once the context emitted `close`.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.target.is_closed()
    }

    /// Sets the default timeout for this context and its pages.
    pub fn set_default_timeout(&self, timeout: Duration) {
        self.inner.target.timeouts().set_default_timeout(timeout);
    }
}

// ============================================================================
// BrowserContext - Pages
// ============================================================================

impl BrowserContext {
    /// Opens a new page in this context.
    ///
    /// # Errors
    ///
    /// - errors from sending the request
    /// - [`Error::Protocol`] if the reply carries no page guid
    pub fn new_page(&self) -> Result<Page> {
        let reply = self.send("newPage", json!({}))?;
        let guid = reply
            .get("page")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::protocol("No page guid in newPage reply"))?;

        Ok(self.attach_page(ObjectId::new(guid)))
    }

    /// Binds a handle to an existing page of this context.
    #[must_use]
    pub fn attach_page(&self, guid: ObjectId) -> Page {
        Page::attach(
            self.connection().clone(),
            guid,
            Some(self.clone()),
            self.inner.target.timeouts(),
        )
    }
}

// ============================================================================
// BrowserContext - Routing
// ============================================================================

impl BrowserContext {
    /// Routes requests of every page in this context.
    ///
    /// # Errors
    ///
    /// Returns errors from publishing interception patterns.
    pub fn route(&self, matcher: UrlMatcher, handler: impl Into<RouteHandler>) -> Result<()> {
        self.inner
            .target
            .interception()
            .route(matcher, handler.into(), None)
    }

    /// Routes at most `times` requests to `handler`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `times` is zero
    /// - errors from publishing interception patterns
    pub fn route_times(
        &self,
        matcher: UrlMatcher,
        handler: impl Into<RouteHandler>,
        times: usize,
    ) -> Result<()> {
        self.inner
            .target
            .interception()
            .route(matcher, handler.into(), Some(times))
    }

    /// Removes routes registered with an equal matcher.
    ///
    /// # Errors
    ///
    /// Returns errors from publishing interception patterns.
    pub fn unroute(&self, matcher: &UrlMatcher, handler: Option<&RouteHandler>) -> Result<()> {
        self.inner.target.interception().unroute(matcher, handler)
    }

    /// Removes every route of this context.
    ///
    /// # Errors
    ///
    /// Returns errors from publishing interception patterns.
    pub fn unroute_all(&self) -> Result<()> {
        self.inner.target.interception().unroute_all()
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.inner.target.interception().router().len()
    }
}

// ============================================================================
// BrowserContext - Events & Waiting
// ============================================================================

impl BrowserContext {
    /// Subscribes to a context event.
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&Value) -> Result<()> + Send + Sync + 'static,
    {
        self.inner.target.listeners().add(event, listener)
    }

    /// Removes a subscription.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.inner.target.listeners().remove(event, id)
    }

    /// Runs `action` and waits for `event`.
    ///
    /// # Errors
    ///
    /// See [`Page::wait_for_event`].
    pub fn wait_for_event<A>(
        &self,
        event: &str,
        predicate: Option<EventPredicate<Value>>,
        timeout: Option<Duration>,
        action: A,
    ) -> Result<Value>
    where
        A: FnOnce() -> Result<()>,
    {
        self.inner
            .target
            .wait_for_event(event, predicate, timeout, action)
    }

    /// Runs `action` and waits for a new page in this context.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] if the event carries no page guid
    /// - see [`Page::wait_for_event`]
    pub fn wait_for_page<A>(&self, timeout: Option<Duration>, action: A) -> Result<Page>
    where
        A: FnOnce() -> Result<()>,
    {
        let params = self.wait_for_event(names::PAGE, None, timeout, action)?;
        let guid = params
            .get("page")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::protocol("No page guid in page event"))?;

        Ok(self.attach_page(ObjectId::new(guid)))
    }

    /// Waits until `condition` holds.
    ///
    /// # Errors
    ///
    /// See [`Page::wait_for_event`].
    pub fn wait_for_condition<F>(&self, condition: F, timeout: Option<Duration>) -> Result<()>
    where
        F: Fn() -> bool + Send + 'static,
    {
        self.inner.target.wait_for_condition(condition, timeout)
    }

    /// Sends a request to the context object and waits for the reply.
    ///
    /// # Errors
    ///
    /// See [`Connection::send_message`].
    pub fn send(&self, method: &str, params: Value) -> Result<Value> {
        self.connection().send_message(self.guid(), method, params)
    }

    /// Asks the remote end to close the context.
    ///
    /// # Errors
    ///
    /// Returns errors from sending the request.
    pub fn close(&self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.send("close", json!({}))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::client::ClientOptions;
    use crate::transport::{MemoryPeer, MemoryTransport};

    fn context() -> (BrowserContext, MemoryPeer) {
        let (transport, peer) = MemoryTransport::pair();
        let connection = Connection::new(transport, ClientOptions::default()).expect("connection");
        let timeouts = TimeoutSettings::new(connection.options().timeout);
        let context = BrowserContext::attach(connection, ObjectId::new("context@1"), &timeouts);
        (context, peer)
    }

    #[test]
    fn test_new_page() {
        let (context, peer) = context();
        peer.respond_with(|request| vec![MemoryPeer::ok_reply(request, json!({ "page": "page@7" }))]);

        let page = context.new_page().expect("page");
        assert_eq!(page.guid().as_str(), "page@7");
        assert_eq!(page.context().map(BrowserContext::guid), Some(context.guid()));
    }

    #[test]
    fn test_new_page_without_guid() {
        let (context, peer) = context();
        peer.respond_ok();
        assert!(matches!(context.new_page(), Err(Error::Protocol { .. })));
    }

    #[test]
    fn test_wait_for_page() {
        let (context, peer) = context();
        let page = context
            .wait_for_page(None, || {
                peer.push_event("context@1", names::PAGE, json!({ "page": "page@3" }));
                Ok(())
            })
            .expect("page");
        assert_eq!(page.guid().as_str(), "page@3");
    }

    #[test]
    fn test_page_inherits_context_timeout() {
        let (context, _peer) = context();
        context.set_default_timeout(Duration::from_millis(20));
        let page = context.attach_page(ObjectId::new("page@1"));

        let err = page
            .wait_for_event("never", None, None, || Ok(()))
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("20ms"));
    }

    #[test]
    fn test_close_event_marks_closed() {
        let (context, peer) = context();
        peer.push_event("context@1", names::CLOSE, json!({}));
        context
            .wait_for_event(names::CLOSE, None, None, || Ok(()))
            .expect("close");
        assert!(context.is_closed());
    }
}
