//! Cooperative waiting primitives.
//!
//! Blocking calls are implemented by pumping the shared message channel on
//! the waiting call stack until a [`Waitable`] resolves. This module holds
//! the pieces the driver composes.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `listeners` | Per-event-type subscriber registry |
//! | `waitable` | Waitable trait and its implementations |
//! | `waiter` | Race builder for typed waits |

// ============================================================================
// Submodules
// ============================================================================

/// Per-event-type subscriber registry.
pub mod listeners;

/// Composable suspend conditions.
pub mod waitable;

/// Race builder.
pub mod waiter;

// ============================================================================
// Re-exports
// ============================================================================

pub use listeners::{Listener, ListenerCollection};
pub use waitable::{
    BoxedWaitable, DEFAULT_POLL_INTERVAL, EventPredicate, ReplySlot, Waitable, WaitableEvent,
    WaitableFailure, WaitableNever, WaitablePredicate, WaitableRace, WaitableReply,
    WaitableTimeout,
};
pub use waiter::Waiter;
