//! Event message types.
//!
//! Events are notifications pushed from the remote end to the local end.
//! Each event targets one object by guid and is fanned out through that
//! object's [`ListenerCollection`](crate::waiting::ListenerCollection).
//!
//! # Event Names
//!
//! | Name | Target | Meaning |
//! |------|--------|---------|
//! | `route` | page, context | A request matched the interception patterns |
//! | `request` | page | A request was issued |
//! | `close` | root, page, context | Target went away |
//! | `crash` | page | Renderer crashed |
//! | `page` | context | A page was opened in the context |
//! | `__dispose__` | any | Object removed from the registry |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::ObjectId;

use super::Response;

// ============================================================================
// Event Names
// ============================================================================

/// Well-known event names.
pub mod names {
    /// Intercepted request awaiting a decision.
    pub const ROUTE: &str = "route";
    /// Request issued by the page.
    pub const REQUEST: &str = "request";
    /// Target closed (synthesized on the root object when the channel ends).
    pub const CLOSE: &str = "close";
    /// Target crashed.
    pub const CRASH: &str = "crash";
    /// Page opened in a context.
    pub const PAGE: &str = "page";
    /// Object removed from the registry.
    pub const DISPOSE: &str = "__dispose__";
}

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
///
/// # Format
///
/// ```json
/// {
///   "guid": "page@3",
///   "method": "route",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Target object.
    pub guid: ObjectId,

    /// Event name.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

// ============================================================================
// Message
// ============================================================================

/// Any frame received from the remote end.
#[derive(Debug, Clone)]
pub enum Message {
    /// Reply to an earlier request.
    Response(Response),
    /// Push notification.
    Event(Event),
}

impl Message {
    /// Parses a text frame.
    ///
    /// Frames carrying an `id` are replies, everything else is an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] for malformed JSON and [`Error::Protocol`]
    /// for frames that are neither replies nor events.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        if !value.is_object() {
            return Err(Error::protocol("Frame is not a JSON object"));
        }

        if value.get("id").is_some() {
            return Ok(Self::Response(serde_json::from_value(value)?));
        }

        if value.get("method").is_some() {
            return Ok(Self::Event(serde_json::from_value(value)?));
        }

        Err(Error::protocol("Frame has neither id nor method"))
    }
}

// ============================================================================
// Tests
// ============================================================================
