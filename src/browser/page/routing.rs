//! Page request routing methods.

use tracing::debug;

use crate::error::Result;
use crate::network::{RouteHandler, UrlMatcher};
use crate::protocol::InterceptionPattern;

use super::Page;

// ============================================================================
// Page - Routing
// ============================================================================

impl Page {
    /// Routes requests matching `matcher` to `handler`.
    ///
    /// Handlers added later run first. A handler must settle the route or
    /// call [`Route::fallback`](crate::Route::fallback); unsettled requests
    /// go on to the context's handlers and are finally resumed unmodified.
    ///
    /// # Errors
    ///
    /// Returns errors from publishing interception patterns.
    ///
    /// # Example
    ///
    /// ```ignore
    /// page.route(UrlMatcher::glob("**/*.png")?, |route: Route| route.abort(None))?;
    /// ```
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
    /// - [`Error::InvalidArgument`](crate::Error::InvalidArgument) if `times` is zero
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

    /// Routes requests matching a glob resolved against the client base URL.
    ///
    /// # Errors
    ///
    /// - [`Error::Regex`](crate::Error::Regex) if the glob does not compile
    /// - errors from publishing interception patterns
    pub fn route_glob(&self, glob: &str, handler: impl Into<RouteHandler>) -> Result<()> {
        let base_url = self.connection().options().base_url.as_ref();
        let matcher = UrlMatcher::glob_with_base(glob, base_url)?;
        self.route(matcher, handler)
    }

    /// Removes routes registered with an equal matcher.
    ///
    /// With `handler`, only that registration is removed.
    ///
    /// # Errors
    ///
    /// Returns errors from publishing interception patterns.
    pub fn unroute(&self, matcher: &UrlMatcher, handler: Option<&RouteHandler>) -> Result<()> {
        debug!(guid = %self.guid(), %matcher, "Unrouting");
        self.inner.target.interception().unroute(matcher, handler)
    }

    /// Removes every route of this page.
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

    /// Returns the interception patterns last published for this page.
    #[must_use]
    pub fn interception_patterns(&self) -> Vec<InterceptionPattern> {
        self.inner.target.interception().published()
    }
}
