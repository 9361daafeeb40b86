//! Request interception.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `glob` | URL glob compilation and base URL resolution |
//! | `matcher` | [`UrlMatcher`] |
//! | `route` | [`Route`] handles and intercepted request data |
//! | `router` | [`Router`], the ordered handler chain |
//! | `interception` | Router bound to a remote object |
//!
//! # Example
//!
//! ```ignore
//! use conduit_driver::{FulfillOptions, Route, UrlMatcher};
//!
//! page.route(UrlMatcher::glob("**/*.png")?, |route: Route| route.abort(None))?;
//!
//! page.route(UrlMatcher::glob("**/api/*")?, |route: Route| {
//!     route.fulfill(FulfillOptions::new().content_type("application/json").body("{}"))
//! })?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

pub mod glob;
pub mod interception;
pub mod matcher;
pub mod route;
pub mod router;

// ============================================================================
// Re-exports
// ============================================================================

pub use glob::{glob_to_regex_pattern, resolve_glob_base};
pub use interception::Interception;
pub use matcher::{UrlMatcher, UrlPredicate};
pub use route::{
    ContinueOptions, DEFAULT_ABORT_ERROR_CODE, FallbackOptions, FulfillOptions,
    InterceptedRequest, Route,
};
pub use router::{HandleResult, RouteHandler, RouteRule, Router};
