//! Message channel and blocking-wait driver.
//!
//! This module handles the duplex channel between the local end (Rust) and
//! the remote engine, and the cooperative pump that drives it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐                    ┌─────────────────┐
//! │  Connection              │                    │  Remote engine  │
//! │                          │     Transport      │                 │
//! │  run_until ─► pump_once ─┼───────────────────►│                 │
//! │      ▲          │        │◄───────────────────┼─ replies/events │
//! │      │      dispatch     │                    │                 │
//! │      │       │     │     │                    └─────────────────┘
//! │  ReplySlot ◄─┘     └─► ObjectRegistry ─► ListenerCollection
//! └──────────────────────────┘
//! ```
//!
//! There is no background reader. Whichever call stack is blocked in
//! [`Connection::run_until`] reads exactly one frame at a time and
//! dispatches it before checking its own condition again.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Correlation, dispatch and the blocking-wait driver |
//! | `memory` | In-process transport pair |
//! | `registry` | Object arena keyed by guid |
//! | `websocket` | WebSocket transport |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Correlation, dispatch and the blocking-wait driver.
pub mod connection;

/// In-process transport pair.
pub mod memory;

/// Object arena keyed by guid.
pub mod registry;

/// WebSocket transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, WeakConnection};
pub use memory::{MemoryPeer, MemoryTransport};
pub use registry::{ObjectListeners, ObjectRegistry};
pub use websocket::WebSocketTransport;

// ============================================================================
// Transport Trait
// ============================================================================

/// Duplex text-frame channel.
///
/// Implementations only move frames; correlation and dispatch live in
/// [`Connection`]. `recv` must be cancel-safe: the pump drops the future
/// when a waitable deadline passes first.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one frame.
    async fn send(&self, frame: String) -> Result<()>;

    /// Receives the next frame, or `None` once the channel ended.
    async fn recv(&self) -> Result<Option<String>>;

    /// Closes the channel.
    async fn close(&self) -> Result<()>;
}
