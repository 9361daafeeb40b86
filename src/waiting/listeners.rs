//! Per-event-type multi-subscriber registry.
//!
//! Every remote object owns one [`ListenerCollection`]. The pump fans event
//! frames out through it, and waitables subscribe to it to observe events.
//!
//! # Reentrancy
//!
//! Listeners run without any lock held, so a listener may add or remove
//! listeners (itself included) or start a nested wait. A notification works
//! on a snapshot taken when it starts:
//!
//! - listeners removed mid-notification are not invoked afterwards;
//! - remaining listeners are neither skipped nor invoked twice;
//! - listeners added mid-notification only see later notifications.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::Result;
use crate::identifiers::ListenerId;

// ============================================================================
// Types
// ============================================================================

/// Listener callback type.
///
/// Returning an error does not stop delivery to the remaining listeners;
/// the first error is reported by [`ListenerCollection::notify`].
pub type Listener<T> = Arc<dyn Fn(&T) -> Result<()> + Send + Sync>;

/// A registered listener.
struct Entry<T> {
    id: ListenerId,
    callback: Listener<T>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

// ============================================================================
// ListenerCollection
// ============================================================================

/// Mapping from event name to ordered listeners.
///
/// Insertion order defines notification order.
pub struct ListenerCollection<T> {
    /// Listeners by event name.
    listeners: Mutex<FxHashMap<String, Vec<Entry<T>>>>,
    /// Next listener ID.
    next_id: AtomicU64,
}

impl<T> Default for ListenerCollection<T> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<T> fmt::Debug for ListenerCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        f.debug_struct("ListenerCollection")
            .field("events", &listeners.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<T> ListenerCollection<T> {
    /// Creates an empty collection.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a listener to `event`.
    ///
    /// Returns the handle used to remove it.
    pub fn add<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&T) -> Result<()> + Send + Sync + 'static,
    {
        let id = ListenerId::new(self.next_id.fetch_add(1, Ordering::Relaxed));

        self.listeners
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(Entry {
                id,
                callback: Arc::new(listener),
            });

        trace!(event, %id, "Listener added");
        id
    }

    /// Removes a listener.
    ///
    /// Returns `false` if it was not registered (already removed).
    pub fn remove(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();

        let Some(entries) = listeners.get_mut(event) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;

        if entries.is_empty() {
            listeners.remove(event);
        }

        if removed {
            trace!(event, %id, "Listener removed");
        }
        removed
    }

    /// Returns `true` if any listener is subscribed to `event`.
    #[inline]
    #[must_use]
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listeners
            .lock()
            .get(event)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Returns the number of listeners subscribed to `event`.
    #[inline]
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Removes every listener of every event.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    /// Delivers `payload` to the listeners of `event` in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a listener, after every listener
    /// has been given the payload.
    pub fn notify(&self, event: &str, payload: &T) -> Result<()> {
        let snapshot: Vec<Entry<T>> = match self.listeners.lock().get(event) {
            Some(entries) => entries.clone(),
            None => return Ok(()),
        };

        let mut first_error = None;

        for entry in snapshot {
            if !self.is_registered(event, entry.id) {
                continue;
            }

            if let Err(e) = (entry.callback)(payload)
                && first_error.is_none()
            {
                first_error = Some(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Checks whether a listener is still subscribed.
    fn is_registered(&self, event: &str, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .get(event)
            .is_some_and(|entries| entries.iter().any(|entry| entry.id == id))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Listener<u32>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = Arc::clone(&log);
        let make = move |name: &str| -> Listener<u32> {
            let log = Arc::clone(&log_clone);
            let name = name.to_string();
            Arc::new(move |value: &u32| {
                log.lock().push(format!("{name}:{value}"));
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn test_notify_in_insertion_order() {
        let listeners = ListenerCollection::<u32>::new();
        let (log, make) = recorder();

        let a = make("a");
        let b = make("b");
        listeners.add("evt", move |v| a(v));
        listeners.add("evt", move |v| b(v));

        listeners.notify("evt", &1).expect("notify");
        assert_eq!(*log.lock(), vec!["a:1", "b:1"]);
    }

    #[test]
    fn test_notify_other_event_is_ignored() {
        let listeners = ListenerCollection::<u32>::new();
        let (log, make) = recorder();
        let a = make("a");
        listeners.add("evt", move |v| a(v));

        listeners.notify("other", &1).expect("notify");
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_remove_and_has_listeners() {
        let listeners = ListenerCollection::<u32>::new();
        let id = listeners.add("evt", |_| Ok(()));

        assert!(listeners.has_listeners("evt"));
        assert!(listeners.remove("evt", id));
        assert!(!listeners.remove("evt", id));
        assert!(!listeners.has_listeners("evt"));
        assert_eq!(listeners.listener_count("evt"), 0);
    }

    #[test]
    fn test_self_removal_during_notify() {
        let listeners = Arc::new(ListenerCollection::<u32>::new());
        let (log, make) = recorder();

        let own_id = Arc::new(Mutex::new(None));
        let own_id_clone = Arc::clone(&own_id);
        let weak = Arc::downgrade(&listeners);
        let a = make("a");
        let id = listeners.add("evt", move |v| {
            a(v)?;
            if let (Some(listeners), Some(id)) = (weak.upgrade(), *own_id_clone.lock()) {
                listeners.remove("evt", id);
            }
            Ok(())
        });
        *own_id.lock() = Some(id);

        let b = make("b");
        listeners.add("evt", move |v| b(v));

        listeners.notify("evt", &1).expect("notify");
        listeners.notify("evt", &2).expect("notify");

        assert_eq!(*log.lock(), vec!["a:1", "b:1", "b:2"]);
    }

    #[test]
    fn test_removing_later_listener_during_notify() {
        let listeners = Arc::new(ListenerCollection::<u32>::new());
        let (log, make) = recorder();

        let victim = Arc::new(Mutex::new(None));
        let victim_clone = Arc::clone(&victim);
        let weak = Arc::downgrade(&listeners);
        let a = make("a");
        listeners.add("evt", move |v| {
            a(v)?;
            if let (Some(listeners), Some(id)) = (weak.upgrade(), *victim_clone.lock()) {
                listeners.remove("evt", id);
            }
            Ok(())
        });

        let b = make("b");
        *victim.lock() = Some(listeners.add("evt", move |v| b(v)));

        let c = make("c");
        listeners.add("evt", move |v| c(v));

        listeners.notify("evt", &1).expect("notify");
        assert_eq!(*log.lock(), vec!["a:1", "c:1"]);
    }

    #[test]
    fn test_listener_added_during_notify_waits_for_next_event() {
        let listeners = Arc::new(ListenerCollection::<u32>::new());
        let (log, make) = recorder();

        let weak = Arc::downgrade(&listeners);
        let late = Arc::new(Mutex::new(Some(make("late"))));
        listeners.add("evt", move |_| {
            if let (Some(listeners), Some(late)) = (weak.upgrade(), late.lock().take()) {
                listeners.add("evt", move |v| late(v));
            }
            Ok(())
        });

        listeners.notify("evt", &1).expect("notify");
        assert!(log.lock().is_empty());

        listeners.notify("evt", &2).expect("notify");
        assert_eq!(*log.lock(), vec!["late:2"]);
    }

    #[test]
    fn test_error_reported_after_all_listeners_ran() {
        let listeners = ListenerCollection::<u32>::new();
        let (log, make) = recorder();

        listeners.add("evt", |_| Err(Error::protocol("first")));
        listeners.add("evt", |_| Err(Error::protocol("second")));
        let c = make("c");
        listeners.add("evt", move |v| c(v));

        let err = listeners.notify("evt", &5).unwrap_err();
        assert_eq!(err.to_string(), "Protocol error: first");
        assert_eq!(*log.lock(), vec!["c:5"]);
    }
}
