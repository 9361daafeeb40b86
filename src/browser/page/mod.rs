//! Remote page handle.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Page struct, accessors, events |
//! | `routing` | Request interception |
//! | `waiting` | Typed waits |
//!
//! # Example
//!
//! ```ignore
//! let page = context.new_page()?;
//!
//! // Block images
//! page.route(UrlMatcher::glob("**/*.{png,jpg}")?, |route: Route| route.abort(None))?;
//!
//! // Wait for an API call triggered by an action
//! let request = page.wait_for_request(&UrlMatcher::glob("**/api/**")?, None, || {
//!     page.send("goto", json!({ "url": "https://example.com" })).map(drop)
//! })?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod core;
mod routing;
mod waiting;

// ============================================================================
// Re-exports
// ============================================================================

pub use core::Page;
