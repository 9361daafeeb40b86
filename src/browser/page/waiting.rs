//! Page wait methods.
//!
//! Every wait runs its action once, then dispatches incoming frames until
//! the awaited condition holds. It fails early when the page closes or
//! crashes, or when the connection is lost. A `None` timeout uses the
//! page default; zero waits indefinitely.

use std::time::Duration;

use serde_json::Value;

use crate::error::Result;
use crate::network::{InterceptedRequest, UrlMatcher};
use crate::protocol::names;
use crate::waiting::EventPredicate;

use super::Page;

// ============================================================================
// Page - Waiting
// ============================================================================

impl Page {
    /// Runs `action` and waits for `event`.
    ///
    /// Returns the params of the first event accepted by `predicate`.
    ///
    /// # Errors
    ///
    /// - the error returned by `action`
    /// - [`Error::Timeout`](crate::Error::Timeout)
    /// - [`Error::TargetClosed`](crate::Error::TargetClosed) or
    ///   [`Error::Crashed`](crate::Error::Crashed)
    /// - [`Error::ConnectionClosed`](crate::Error::ConnectionClosed)
    /// - errors raised by listeners dispatched while waiting
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

    /// Runs `action` and waits for a request whose URL matches `matcher`.
    ///
    /// # Errors
    ///
    /// See [`Page::wait_for_event`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// let request = page.wait_for_request(&UrlMatcher::glob("**/api/*")?, None, || {
    ///     page.send("click", json!({ "selector": "#load" })).map(drop)
    /// })?;
    /// ```
    pub fn wait_for_request<A>(
        &self,
        matcher: &UrlMatcher,
        timeout: Option<Duration>,
        action: A,
    ) -> Result<InterceptedRequest>
    where
        A: FnOnce() -> Result<()>,
    {
        let matcher = matcher.clone();
        let predicate: EventPredicate<Value> = Box::new(move |params: &Value| {
            params
                .get("request")
                .and_then(|request| request.get("url"))
                .and_then(|url| url.as_str())
                .is_some_and(|url| matcher.test(url))
        });

        let params = self.wait_for_event(names::REQUEST, Some(predicate), timeout, action)?;
        Ok(InterceptedRequest::from_params(
            params.get("request").unwrap_or(&Value::Null),
        ))
    }

    /// Waits for the page to close.
    ///
    /// Returns immediately if it already did.
    ///
    /// # Errors
    ///
    /// See [`Page::wait_for_event`].
    pub fn wait_for_close<A>(&self, timeout: Option<Duration>, action: A) -> Result<()>
    where
        A: FnOnce() -> Result<()>,
    {
        if self.is_closed() {
            return action();
        }
        self.wait_for_event(names::CLOSE, None, timeout, action)?;
        Ok(())
    }

    /// Waits until `condition` holds.
    ///
    /// The condition is checked after every dispatched frame and at least
    /// once per poll interval.
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

    /// Keeps dispatching events for `duration`.
    ///
    /// # Errors
    ///
    /// Returns errors raised by listeners dispatched while waiting.
    pub fn wait_for_timeout(&self, duration: Duration) -> Result<()> {
        self.inner.target.wait_for_timeout(duration)
    }
}
