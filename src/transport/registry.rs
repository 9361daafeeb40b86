//! Object arena keyed by guid.
//!
//! The registry owns one listener collection per live remote object. Event
//! frames are resolved through it by guid; wrappers (pages, contexts) hold
//! only the guid and a handle to their collection, never each other.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::debug;

use crate::identifiers::ObjectId;
use crate::waiting::ListenerCollection;

// ============================================================================
// Types
// ============================================================================

/// Listener collection of one remote object.
pub type ObjectListeners = Arc<ListenerCollection<Value>>;

// ============================================================================
// ObjectRegistry
// ============================================================================

/// Arena of live remote objects.
///
/// The root object (empty guid) is always present.
#[derive(Debug)]
pub struct ObjectRegistry {
    objects: RwLock<FxHashMap<ObjectId, ObjectListeners>>,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        let mut objects = FxHashMap::default();
        objects.insert(ObjectId::root(), Arc::new(ListenerCollection::new()));
        Self {
            objects: RwLock::new(objects),
        }
    }
}

impl ObjectRegistry {
    /// Creates a registry holding only the root object.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object, returning its listener collection.
    ///
    /// Registering a guid twice returns the existing collection.
    pub fn register(&self, guid: &ObjectId) -> ObjectListeners {
        let mut objects = self.objects.write();
        let listeners = objects
            .entry(guid.clone())
            .or_insert_with(|| {
                debug!(%guid, "Object registered");
                Arc::new(ListenerCollection::new())
            });
        Arc::clone(listeners)
    }

    /// Removes an object. The root object cannot be removed.
    pub fn unregister(&self, guid: &ObjectId) -> Option<ObjectListeners> {
        if guid.is_root() {
            return None;
        }
        let removed = self.objects.write().remove(guid);
        if removed.is_some() {
            debug!(%guid, "Object unregistered");
        }
        removed
    }

    /// Resolves an object's listener collection.
    #[must_use]
    pub fn lookup(&self, guid: &ObjectId) -> Option<ObjectListeners> {
        self.objects.read().get(guid).cloned()
    }

    /// Returns the root object's listener collection.
    #[must_use]
    pub fn root(&self) -> ObjectListeners {
        self.lookup(&ObjectId::root())
            .unwrap_or_else(|| self.register(&ObjectId::root()))
    }

    /// Returns the number of registered objects, root included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Returns `true` if only the root object is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_always_present() {
        let registry = ObjectRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.lookup(&ObjectId::root()).is_some());
        assert!(registry.unregister(&ObjectId::root()).is_none());
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = ObjectRegistry::new();
        let guid = ObjectId::new("page@1");

        let first = registry.register(&guid);
        let second = registry.register(&guid);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unregister() {
        let registry = ObjectRegistry::new();
        let guid = ObjectId::new("page@1");
        registry.register(&guid);

        assert!(registry.unregister(&guid).is_some());
        assert!(registry.lookup(&guid).is_none());
        assert!(registry.unregister(&guid).is_none());
    }
}
