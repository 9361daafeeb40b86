//! Ordered route handlers and the per-request dispatch.
//!
//! Rules are kept most recent first. For each intercepted request the
//! router walks a snapshot of the rules:
//!
//! ```text
//! rule matches? ──no──► next rule
//!      │yes
//! consume one use (drop rule at zero)
//!      │
//! call handler ──► handled ──────────► Handled
//!      │
//!      ├──────────► kept the route ───► PendingHandler
//!      │
//!      └──────────► fallback() ───────► next rule
//!
//! out of rules ──► Fallback / NoMatchingHandler (caller resumes)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::InterceptionPattern;

use super::matcher::UrlMatcher;
use super::route::Route;

// ============================================================================
// RouteHandler
// ============================================================================

/// Handler closure type.
type HandlerFn = dyn Fn(Route) -> Result<()> + Send + Sync;

/// Shared route handler, compared by identity.
///
/// Keep a clone of the handler passed to `route` to remove exactly that
/// registration later.
#[derive(Clone)]
pub struct RouteHandler(Arc<HandlerFn>);

impl RouteHandler {
    /// Wraps a closure.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(Route) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(handler))
    }

    /// Invokes the handler.
    ///
    /// # Errors
    ///
    /// Returns whatever the handler returns.
    #[inline]
    pub fn call(&self, route: Route) -> Result<()> {
        (self.0)(route)
    }

    /// Returns `true` if both handles wrap the same closure.
    #[inline]
    #[must_use]
    pub fn same(&self, other: &RouteHandler) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl<F> From<F> for RouteHandler
where
    F: Fn(Route) -> Result<()> + Send + Sync + 'static,
{
    fn from(handler: F) -> Self {
        Self::new(handler)
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RouteHandler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

// ============================================================================
// RouteRule
// ============================================================================

/// One registered handler.
#[derive(Debug)]
pub struct RouteRule {
    matcher: UrlMatcher,
    handler: RouteHandler,
    /// Remaining uses; `None` is unlimited.
    remaining: Option<AtomicUsize>,
}

impl RouteRule {
    fn new(matcher: UrlMatcher, handler: RouteHandler, times: Option<usize>) -> Self {
        Self {
            matcher,
            handler,
            remaining: times.map(AtomicUsize::new),
        }
    }

    /// Returns the matcher.
    #[inline]
    #[must_use]
    pub fn matcher(&self) -> &UrlMatcher {
        &self.matcher
    }

    /// Returns the remaining uses, `None` if unlimited.
    #[must_use]
    pub fn remaining(&self) -> Option<usize> {
        self.remaining
            .as_ref()
            .map(|remaining| remaining.load(Ordering::Acquire))
    }
}

// ============================================================================
// HandleResult
// ============================================================================

/// Outcome of routing one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleResult {
    /// No rule matched. The caller resumes the request.
    NoMatchingHandler,
    /// A handler settled the request.
    Handled,
    /// Every matching handler fell back. The caller resumes the request.
    Fallback,
    /// A handler kept the route without deciding yet.
    PendingHandler,
}

impl HandleResult {
    /// Returns `true` if the caller must resume the request.
    #[inline]
    #[must_use]
    pub fn needs_resume(self) -> bool {
        matches!(self, Self::NoMatchingHandler | Self::Fallback)
    }
}

// ============================================================================
// Router
// ============================================================================

/// Ordered, mutable set of route rules.
#[derive(Debug, Default)]
pub struct Router {
    rules: Mutex<Vec<Arc<RouteRule>>>,
}

impl Router {
    /// Creates an empty router.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler ahead of every existing one.
    ///
    /// `times` limits how many requests the rule handles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `times` is zero.
    pub fn add(&self, matcher: UrlMatcher, handler: RouteHandler, times: Option<usize>) -> Result<()> {
        if times == Some(0) {
            return Err(Error::invalid_argument("Route times must be greater than zero"));
        }

        debug!(%matcher, ?times, "Route added");
        let rule = Arc::new(RouteRule::new(matcher, handler, times));
        self.rules.lock().insert(0, rule);
        Ok(())
    }

    /// Removes rules with an equal matcher and, if given, the same handler.
    ///
    /// Returns the number of rules removed.
    pub fn remove(&self, matcher: &UrlMatcher, handler: Option<&RouteHandler>) -> usize {
        let mut rules = self.rules.lock();
        let before = rules.len();
        rules.retain(|rule| {
            let selected =
                rule.matcher == *matcher && handler.is_none_or(|handler| rule.handler.same(handler));
            !selected
        });
        let removed = before - rules.len();
        debug!(%matcher, removed, "Route removed");
        removed
    }

    /// Removes every rule.
    pub fn clear(&self) {
        self.rules.lock().clear();
    }

    /// Returns the number of rules.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.lock().len()
    }

    /// Returns `true` if no rule is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.lock().is_empty()
    }

    /// Returns the pattern set the remote end must intercept.
    ///
    /// Any rule that cannot be expressed as a pattern widens the set to
    /// everything. An empty set disables interception.
    #[must_use]
    pub fn interception_patterns(&self) -> Vec<InterceptionPattern> {
        let rules = self.rules.lock();
        let mut patterns: Vec<InterceptionPattern> = Vec::with_capacity(rules.len());

        for rule in rules.iter() {
            match rule.matcher.to_pattern() {
                Ok(pattern) => {
                    if !patterns.contains(&pattern) {
                        patterns.push(pattern);
                    }
                }
                Err(_) => return vec![InterceptionPattern::match_all()],
            }
        }
        patterns
    }

    /// Routes one request through the matching handlers.
    ///
    /// Handlers run without any router lock held; they may add or remove
    /// rules, which affects later requests only.
    ///
    /// Rules always match against the URL the request was intercepted
    /// with. A `url` passed to [`Route::fallback`] is visible to older
    /// handlers through [`Route::request`] and is sent on resume, but does
    /// not change which rules match.
    ///
    /// # Errors
    ///
    /// Returns the first handler error. Handlers after it are not called.
    pub fn handle(&self, route: &Route) -> Result<HandleResult> {
        let snapshot: Vec<Arc<RouteRule>> = self.rules.lock().clone();
        let url = route.original_request().url.clone();
        let mut result = HandleResult::NoMatchingHandler;

        for rule in snapshot {
            if !rule.matcher.test(&url) || !self.consume(&rule) {
                continue;
            }

            trace!(url, matcher = %rule.matcher, "Invoking route handler");
            route.begin_handler();
            rule.handler.call(route.clone())?;

            if route.is_handled() {
                return Ok(HandleResult::Handled);
            }
            if !route.fallback_called() {
                route.set_resume_on_fallback();
                return Ok(HandleResult::PendingHandler);
            }
            result = HandleResult::Fallback;
        }

        Ok(result)
    }

    /// Takes one use of `rule`, dropping it from the live list when used up.
    ///
    /// Returns `false` if the rule has no uses left.
    fn consume(&self, rule: &Arc<RouteRule>) -> bool {
        let Some(remaining) = &rule.remaining else {
            return true;
        };

        let mut rules = self.rules.lock();
        let left = remaining.load(Ordering::Acquire);
        if left == 0 {
            return false;
        }
        remaining.store(left - 1, Ordering::Release);

        if left == 1 {
            rules.retain(|live| !Arc::ptr_eq(live, rule));
            debug!(matcher = %rule.matcher, "Route expired");
        }
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex as PlMutex;
    use serde_json::json;

    use crate::client::ClientOptions;
    use crate::identifiers::ObjectId;
    use crate::network::route::{FallbackOptions, InterceptedRequest};
    use crate::transport::{Connection, MemoryPeer, MemoryTransport};

    struct Fixture {
        connection: Connection,
        peer: MemoryPeer,
        log: Arc<PlMutex<Vec<&'static str>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let (transport, peer) = MemoryTransport::pair();
            peer.respond_ok();
            Self {
                connection: Connection::new(transport, ClientOptions::default())
                    .expect("connection"),
                peer,
                log: Arc::new(PlMutex::new(Vec::new())),
            }
        }

        fn route(&self, url: &str) -> Route {
            let request = InterceptedRequest::from_params(&json!({ "url": url }));
            Route::new(ObjectId::new("route@1"), request, self.connection.clone())
        }

        fn fallback(&self, name: &'static str) -> RouteHandler {
            let log = Arc::clone(&self.log);
            RouteHandler::new(move |route: Route| {
                log.lock().push(name);
                route.fallback(FallbackOptions::new())
            })
        }

        fn abort(&self, name: &'static str) -> RouteHandler {
            let log = Arc::clone(&self.log);
            RouteHandler::new(move |route: Route| {
                log.lock().push(name);
                route.abort(None)
            })
        }

        fn keep(&self, name: &'static str) -> RouteHandler {
            let log = Arc::clone(&self.log);
            RouteHandler::new(move |_route: Route| {
                log.lock().push(name);
                Ok(())
            })
        }

        fn calls(&self) -> Vec<&'static str> {
            std::mem::take(&mut *self.log.lock())
        }
    }

    fn glob(pattern: &str) -> UrlMatcher {
        UrlMatcher::glob(pattern).expect("glob")
    }

    #[test]
    fn test_no_rules() {
        let fx = Fixture::new();
        let router = Router::new();
        let result = router.handle(&fx.route("https://x/")).expect("handle");
        assert_eq!(result, HandleResult::NoMatchingHandler);
        assert!(result.needs_resume());
    }

    #[test]
    fn test_most_recent_first() {
        let fx = Fixture::new();
        let router = Router::new();
        router.add(glob("**/*"), fx.abort("first"), None).expect("add");
        router.add(glob("**/*"), fx.abort("second"), None).expect("add");

        let result = router.handle(&fx.route("https://x/a")).expect("handle");
        assert_eq!(result, HandleResult::Handled);
        assert_eq!(fx.calls(), vec!["second"]);
    }

    #[test]
    fn test_fallback_chain_reaches_older_rules() {
        let fx = Fixture::new();
        let router = Router::new();
        router.add(glob("**/*"), fx.abort("old"), None).expect("add");
        router.add(glob("**/*"), fx.fallback("new"), None).expect("add");

        let result = router.handle(&fx.route("https://x/a")).expect("handle");
        assert_eq!(result, HandleResult::Handled);
        assert_eq!(fx.calls(), vec!["new", "old"]);
        assert_eq!(fx.peer.sent_with_method("abort").len(), 1);
    }

    #[test]
    fn test_fallback_exhaustion() {
        let fx = Fixture::new();
        let router = Router::new();
        router.add(glob("**/*"), fx.fallback("a"), None).expect("add");
        router.add(glob("**/*"), fx.fallback("b"), None).expect("add");

        let route = fx.route("https://x/a");
        let result = router.handle(&route).expect("handle");
        assert_eq!(result, HandleResult::Fallback);
        assert!(result.needs_resume());
        assert_eq!(fx.calls(), vec!["b", "a"]);
        assert!(!route.is_handled());
    }

    #[test]
    fn test_pending_handler_blocks_rest_of_chain() {
        let fx = Fixture::new();
        let router = Router::new();
        router.add(glob("**/*"), fx.abort("older"), None).expect("add");
        router.add(glob("**/*"), fx.keep("keeper"), None).expect("add");

        let route = fx.route("https://x/a");
        let result = router.handle(&route).expect("handle");
        assert_eq!(result, HandleResult::PendingHandler);
        assert_eq!(fx.calls(), vec!["keeper"]);

        // The kept route falls back later: resumed directly, older rule untouched
        route.fallback(FallbackOptions::new()).expect("late fallback");
        assert_eq!(fx.calls(), Vec::<&str>::new());
        let sent = fx.peer.sent_with_method("continue");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["params"]["isFallback"], true);
    }

    #[test]
    fn test_times_expiry() {
        let fx = Fixture::new();
        let router = Router::new();
        router.add(glob("**/*"), fx.abort("twice"), Some(2)).expect("add");

        for _ in 0..2 {
            let result = router.handle(&fx.route("https://x/a")).expect("handle");
            assert_eq!(result, HandleResult::Handled);
        }
        assert!(router.is_empty());

        let result = router.handle(&fx.route("https://x/a")).expect("handle");
        assert_eq!(result, HandleResult::NoMatchingHandler);
        assert_eq!(fx.calls(), vec!["twice", "twice"]);
    }

    #[test]
    fn test_rule_removed_before_handler_runs() {
        let fx = Fixture::new();
        let router = Arc::new(Router::new());
        let seen_len = Arc::new(AtomicUsize::new(usize::MAX));

        let router_clone = Arc::clone(&router);
        let seen_clone = Arc::clone(&seen_len);
        let handler = RouteHandler::new(move |route: Route| {
            seen_clone.store(router_clone.len(), Ordering::Release);
            route.abort(None)
        });
        router.add(glob("**/*"), handler, Some(1)).expect("add");

        router.handle(&fx.route("https://x/a")).expect("handle");
        assert_eq!(seen_len.load(Ordering::Acquire), 0);
    }

    #[test]
    fn test_times_zero_rejected() {
        let fx = Fixture::new();
        let router = Router::new();
        let err = router.add(glob("**/*"), fx.abort("never"), Some(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(router.is_empty());
    }

    #[test]
    fn test_rewritten_url_does_not_change_matching() {
        let fx = Fixture::new();
        let router = Router::new();
        let seen = Arc::new(PlMutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        router
            .add(
                glob("**/old/*"),
                RouteHandler::new(move |route: Route| {
                    log.lock().push(route.request().url);
                    route.abort(None)
                }),
                None,
            )
            .expect("add");
        router
            .add(glob("**/new/*"), fx.abort("new"), None)
            .expect("add");
        router
            .add(
                glob("**/*"),
                RouteHandler::new(|route: Route| {
                    route.fallback(FallbackOptions::new().url("https://x/new/a"))
                }),
                None,
            )
            .expect("add");

        let result = router.handle(&fx.route("https://x/old/a")).expect("handle");
        assert_eq!(result, HandleResult::Handled);
        assert!(fx.calls().is_empty());
        assert_eq!(*seen.lock(), vec!["https://x/new/a".to_string()]);
    }

    #[test]
    fn test_non_matching_rules_are_skipped() {
        let fx = Fixture::new();
        let router = Router::new();
        router.add(glob("**/*.png"), fx.abort("png"), Some(1)).expect("add");

        let result = router.handle(&fx.route("https://x/a.css")).expect("handle");
        assert_eq!(result, HandleResult::NoMatchingHandler);
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_remove_by_matcher_only() {
        let fx = Fixture::new();
        let router = Router::new();
        router.add(glob("**/*.png"), fx.abort("a"), None).expect("add");
        router.add(glob("**/*.png"), fx.abort("b"), None).expect("add");
        router.add(glob("**/*.css"), fx.abort("c"), None).expect("add");

        assert_eq!(router.remove(&glob("**/*.png"), None), 2);
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_remove_by_handler_identity() {
        let fx = Fixture::new();
        let router = Router::new();
        let keep = fx.abort("keep");
        let drop = fx.abort("drop");
        router.add(glob("**/*"), keep.clone(), None).expect("add");
        router.add(glob("**/*"), drop.clone(), None).expect("add");

        assert_eq!(router.remove(&glob("**/*"), Some(&drop)), 1);
        assert_eq!(router.remove(&glob("**/*"), Some(&drop)), 0);

        router.handle(&fx.route("https://x/")).expect("handle");
        assert_eq!(fx.calls(), vec!["keep"]);
    }

    #[test]
    fn test_handler_error_propagates() {
        let fx = Fixture::new();
        let router = Router::new();
        router.add(glob("**/*"), fx.abort("older"), None).expect("add");
        router
            .add(glob("**/*"), RouteHandler::new(|_| Err(Error::protocol("boom"))), None)
            .expect("add");

        let err = router.handle(&fx.route("https://x/")).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(fx.calls().is_empty());
    }

    #[test]
    fn test_handler_may_mutate_router() {
        let fx = Fixture::new();
        let router = Arc::new(Router::new());

        let router_clone = Arc::clone(&router);
        let abort = fx.abort("added");
        let handler = RouteHandler::new(move |route: Route| {
            router_clone.add(UrlMatcher::any(), abort.clone(), None)?;
            route.fallback(FallbackOptions::new())
        });
        router.add(glob("**/*"), handler, Some(1)).expect("add");

        let result = router.handle(&fx.route("https://x/")).expect("handle");
        assert_eq!(result, HandleResult::Fallback);
        assert!(fx.calls().is_empty());

        let result = router.handle(&fx.route("https://x/")).expect("handle");
        assert_eq!(result, HandleResult::Handled);
        assert_eq!(fx.calls(), vec!["added"]);
    }

    #[test]
    fn test_patterns() {
        let fx = Fixture::new();
        let router = Router::new();
        assert!(router.interception_patterns().is_empty());

        router.add(glob("**/*.png"), fx.abort("a"), None).expect("add");
        router.add(glob("**/*.png"), fx.abort("b"), None).expect("add");
        router
            .add(UrlMatcher::regex("api", "i").expect("regex"), fx.abort("c"), None)
            .expect("add");

        assert_eq!(
            router.interception_patterns(),
            vec![
                InterceptionPattern::regex("api", "i"),
                InterceptionPattern::glob("**/*.png"),
            ]
        );

        router
            .add(UrlMatcher::predicate(|_| true), fx.abort("d"), None)
            .expect("add");
        assert_eq!(router.interception_patterns(), vec![InterceptionPattern::match_all()]);

        router.clear();
        assert!(router.interception_patterns().is_empty());
    }
}
