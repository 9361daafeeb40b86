//! Conduit Driver - blocking waits and request routing over an async
//! message channel.
//!
//! This library drives a remote browser engine that speaks a JSON
//! request/reply/event protocol. Every call is synchronous: the calling
//! thread pumps the channel itself until the outcome it waits for is
//! decided, dispatching every unrelated event on the way.
//!
//! # Architecture
//!
//! - **Connection**: owns the transport, correlates replies with requests
//!   and routes events to the object they address
//! - **Waitables**: composable suspend conditions (reply, event, predicate,
//!   timeout, failure) raced by a [`Waiter`]
//! - **Router**: ordered rules mapping intercepted request URLs to handlers,
//!   with page to context fallback and usage limits
//!
//! Key design principles:
//!
//! - One frame per pump, so listeners always run before the wait re-checks
//! - Waits nest: a listener may start a wait of its own on the same thread
//! - Interception patterns are published only when the active set changes
//!
//! # Quick Start
//!
//! ```no_run
//! use conduit_driver::{Client, Result, Route, UrlMatcher};
//!
//! fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .websocket("ws://127.0.0.1:9222/engine")
//!         .build()?;
//!
//!     let context = client.new_context()?;
//!     context.route(UrlMatcher::glob("**/*.png")?, |route: Route| route.abort(None))?;
//!
//!     let page = context.new_page()?;
//!     let request = page.wait_for_request(&UrlMatcher::glob("**/api/**")?, None, || {
//!         page.send("navigate", serde_json::json!({ "url": "https://example.com" }))
//!             .map(drop)
//!     })?;
//!     println!("Requested: {}", request.url);
//!
//!     client.close()
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | Remote handles: [`BrowserContext`], [`Page`] |
//! | [`client`] | [`Client`] entry point and configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`network`] | URL matching, routes and the [`Router`] |
//! | [`protocol`] | Wire message types |
//! | [`transport`] | Transports and the [`Connection`] |
//! | [`waiting`] | Waitables and listener collections |

// ============================================================================
// Modules
// ============================================================================

/// Remote object handles.
///
/// - [`BrowserContext`] - Group of pages sharing routes
/// - [`Page`] - Single page with its own routes and waits
pub mod browser;

/// Client factory and configuration.
///
/// Use [`Client::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for remote objects and requests.
pub mod identifiers;

/// Request interception.
///
/// URL matchers, route decisions and the rule table.
pub mod network;

/// Wire protocol message types.
pub mod protocol;

/// Transport layer and connection driver.
pub mod transport;

/// Synchronous waits over the asynchronous channel.
pub mod waiting;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{BrowserContext, Page};

// Client types
pub use client::{Client, ClientBuilder, ClientOptions, TimeoutSettings};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ListenerId, ObjectId, RequestId};

// Network types
pub use network::{
    ContinueOptions, FallbackOptions, FulfillOptions, HandleResult, InterceptedRequest, Route,
    RouteHandler, Router, UrlMatcher, UrlPredicate,
};

// Transport types
pub use transport::{Connection, MemoryPeer, MemoryTransport, Transport, WebSocketTransport};

// Waiting types
pub use waiting::{
    ListenerCollection, Waitable, WaitableEvent, WaitableFailure, WaitablePredicate,
    WaitableRace, WaitableReply, WaitableTimeout, Waiter,
};
