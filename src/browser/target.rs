//! State shared by pages and contexts.
//!
//! A target is a remote object that can intercept requests, emit events
//! and be closed. It owns the object's listener collection handle, its
//! [`Interception`] and its timeout settings, and builds the races behind
//! every typed wait.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

use crate::client::TimeoutSettings;
use crate::error::{Error, Result};
use crate::identifiers::ObjectId;
use crate::network::{Interception, Route};
use crate::protocol::names;
use crate::transport::{Connection, ObjectListeners};
use crate::waiting::{
    EventPredicate, WaitableEvent, WaitableFailure, WaitablePredicate, Waiter,
};

// ============================================================================
// Constants
// ============================================================================

/// Shortest poll interval used by `wait_for_timeout`.
const MIN_SLEEP_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// Target
// ============================================================================

/// Remote object with routes, events and a lifetime.
pub(crate) struct Target {
    /// Object kind, used in error messages.
    kind: &'static str,
    guid: ObjectId,
    connection: Connection,
    listeners: ObjectListeners,
    interception: Interception,
    timeouts: TimeoutSettings,
    closed: Arc<AtomicBool>,
    /// Present for targets that can crash.
    crashed: Option<Arc<AtomicBool>>,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("kind", &self.kind)
            .field("guid", &self.guid)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Target {
    /// Registers the object and starts tracking its lifetime events.
    pub(crate) fn new(
        kind: &'static str,
        guid: ObjectId,
        connection: Connection,
        timeouts: TimeoutSettings,
        can_crash: bool,
    ) -> Self {
        let listeners = connection.register_object(&guid);

        let closed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&closed);
        let closed_guid = guid.clone();
        listeners.add(names::CLOSE, move |_| {
            debug!(guid = %closed_guid, "Target closed");
            flag.store(true, Ordering::Release);
            Ok(())
        });

        let crashed = can_crash.then(|| {
            let crashed = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&crashed);
            listeners.add(names::CRASH, move |_| {
                flag.store(true, Ordering::Release);
                Ok(())
            });
            crashed
        });

        Self {
            kind,
            interception: Interception::new(guid.clone(), connection.clone()),
            guid,
            connection,
            listeners,
            timeouts,
            closed,
            crashed,
        }
    }
}

// ============================================================================
// Target - Accessors
// ============================================================================

impl Target {
    #[inline]
    pub(crate) fn guid(&self) -> &ObjectId {
        &self.guid
    }

    #[inline]
    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }

    #[inline]
    pub(crate) fn listeners(&self) -> &ObjectListeners {
        &self.listeners
    }

    #[inline]
    pub(crate) fn interception(&self) -> &Interception {
        &self.interception
    }

    #[inline]
    pub(crate) fn timeouts(&self) -> &TimeoutSettings {
        &self.timeouts
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn is_crashed(&self) -> bool {
        self.crashed
            .as_ref()
            .is_some_and(|crashed| crashed.load(Ordering::Acquire))
    }

    fn label(&self) -> String {
        format!("{} {}", self.kind, self.guid)
    }
}

// ============================================================================
// Target - Routing
// ============================================================================

impl Target {
    /// Routes an intercepted request through this target, then `parent`.
    ///
    /// Resumes the request when neither settles it.
    pub(crate) fn dispatch_route(&self, params: &Value, parent: Option<&Target>) -> Result<()> {
        let route = Route::from_event(params, self.connection.clone())?;

        if !self.interception.handle(&route)?.needs_resume() {
            return Ok(());
        }
        if let Some(parent) = parent
            && !parent.interception.handle(&route)?.needs_resume()
        {
            return Ok(());
        }

        route.resume_fallback()
    }
}

// ============================================================================
// Target - Waiting
// ============================================================================

impl Target {
    /// Failure that resolves when this target closes.
    pub(crate) fn closed_waitable<T>(&self) -> WaitableFailure<T> {
        let label = self.label();
        if self.is_closed() {
            return WaitableFailure::fired(move || Error::target_closed(label.clone()));
        }
        WaitableFailure::on_event(&self.listeners, names::CLOSE, move || {
            Error::target_closed(label.clone())
        })
    }

    /// Failure that resolves when this target crashes.
    pub(crate) fn crashed_waitable<T>(&self) -> Option<WaitableFailure<T>> {
        self.crashed.as_ref()?;
        let label = self.label();
        if self.is_crashed() {
            return Some(WaitableFailure::fired(move || Error::crashed(label.clone())));
        }
        Some(WaitableFailure::on_event(&self.listeners, names::CRASH, move || {
            Error::crashed(label.clone())
        }))
    }

    /// Starts a race rejected by close, crash and connection loss.
    ///
    /// The failure matching `awaited` is left out so that waiting for that
    /// very event succeeds.
    pub(crate) fn waiter<T: 'static>(&self, awaited: Option<&str>) -> Waiter<T> {
        let mut waiter = Waiter::new();
        if awaited != Some(names::CLOSE) {
            waiter = waiter.reject_on(self.closed_waitable());
        }
        if awaited != Some(names::CRASH)
            && let Some(crashed) = self.crashed_waitable()
        {
            waiter = waiter.reject_on(crashed);
        }
        waiter.reject_on(self.connection.closed_waitable())
    }

    /// Runs `action` and waits for `event` to be emitted.
    pub(crate) fn wait_for_event<A>(
        &self,
        event: &str,
        predicate: Option<EventPredicate<Value>>,
        timeout: Option<Duration>,
        action: A,
    ) -> Result<Value>
    where
        A: FnOnce() -> Result<()>,
    {
        let timeout = self.timeouts.timeout(timeout);
        let race = self
            .waiter(Some(event))
            .wait_for(WaitableEvent::new(&self.listeners, event, predicate))
            .timeout(timeout, format!("waiting for event \"{event}\""))
            .into_race();

        self.connection.run_until(action, &race)
    }

    /// Waits until `condition` holds.
    pub(crate) fn wait_for_condition<F>(&self, condition: F, timeout: Option<Duration>) -> Result<()>
    where
        F: Fn() -> bool + Send + 'static,
    {
        let timeout = self.timeouts.timeout(timeout);
        let poll_interval = self.connection.options().poll_interval;
        let race = self
            .waiter(None)
            .wait_for(WaitablePredicate::condition(condition, poll_interval))
            .timeout(timeout, "waiting for condition")
            .into_race();

        self.connection.run_until(|| Ok(()), &race)
    }

    /// Keeps dispatching events for `duration`.
    pub(crate) fn wait_for_timeout(&self, duration: Duration) -> Result<()> {
        // No deadline means the duration overflowed: sleep forever
        let deadline = Instant::now().checked_add(duration);
        let sleep = WaitablePredicate::condition(
            move || deadline.is_some_and(|deadline| Instant::now() >= deadline),
            duration.max(MIN_SLEEP_INTERVAL),
        );
        self.connection.run_until(|| Ok(()), &sleep)
    }
}
