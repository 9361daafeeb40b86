//! Wire protocol message types.
//!
//! This module defines the frames exchanged between the local end (Rust)
//! and the remote engine.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command addressed to an object guid |
//! | `Response` | Remote → Local | Reply correlated by request `id` |
//! | `Event` | Remote → Local | Push notification addressed to an object guid |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Typed command definitions |
//! | `event` | Event frames and frame classification |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Typed command definitions.
pub mod command;

/// Event message types.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    Command, CustomCommand, Header, InterceptionPattern, NetworkCommand, RouteCommand,
};
pub use event::{Event, Message, names};
pub use request::{ErrorPayload, Request, Response};
