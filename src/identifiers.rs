//! Type-safe identifiers.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Wraps | Purpose |
//! |------|-------|---------|
//! | [`ObjectId`] | `Arc<str>` | Remote object guid (page, context, route) |
//! | [`RequestId`] | `u64` | Request/reply correlation |
//! | [`ListenerId`] | `u64` | Listener subscription handle |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// ObjectId
// ============================================================================

/// Guid of a remote object.
///
/// The empty guid addresses the connection itself (root object).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(Arc<str>);

impl ObjectId {
    /// Creates an object ID from a guid string.
    #[inline]
    #[must_use]
    pub fn new(guid: impl AsRef<str>) -> Self {
        Self(Arc::from(guid.as_ref()))
    }

    /// Returns the root object ID (the connection).
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Arc::from(""))
    }

    /// Returns `true` for the root object.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the guid as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(guid: &str) -> Self {
        Self::new(guid)
    }
}

impl From<String> for ObjectId {
    fn from(guid: String) -> Self {
        Self(Arc::from(guid))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let guid = String::deserialize(deserializer)?;
        Ok(Self::from(guid))
    }
}

// ============================================================================
// RequestId
// ============================================================================

/// Correlation ID of an outgoing request.
///
/// Allocated from a per-connection counter starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a request ID from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic request ID allocator.
#[derive(Debug)]
pub(crate) struct RequestIdAllocator(AtomicU64);

impl RequestIdAllocator {
    pub(crate) const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub(crate) fn next(&self) -> RequestId {
        RequestId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

// ============================================================================
// ListenerId
// ============================================================================

/// Handle of a listener registered in a
/// [`ListenerCollection`](crate::waiting::ListenerCollection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    #[inline]
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
