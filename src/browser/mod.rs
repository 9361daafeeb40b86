//! Remote object handles.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BrowserContext`] | Group of pages with shared routes |
//! | [`Page`] | Single page: routes, events, waits |
//!
//! Handles hold only the object guid, a connection handle and their own
//! routing state. Event delivery goes through the connection's object
//! registry, so handles never reference one another except page to
//! context.
//!
//! # Example
//!
//! ```ignore
//! use conduit_driver::{Client, Route, UrlMatcher};
//!
//! let client = Client::builder().websocket("ws://127.0.0.1:9222/engine").build()?;
//! let context = client.new_context()?;
//! context.route(UrlMatcher::glob("**/*.css")?, |route: Route| route.abort(None))?;
//!
//! let page = context.new_page()?;
//! page.wait_for_timeout(Duration::from_millis(500))?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Browser context handle.
pub mod context;

/// Page handle.
pub mod page;

mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::BrowserContext;
pub use page::Page;
