//! Composable suspend conditions.
//!
//! A [`Waitable`] is a condition the blocking-wait driver
//! ([`Connection::run_until`](crate::transport::Connection::run_until))
//! pumps the channel for.
//!
//! | Type | Done when | `get()` |
//! |------|-----------|---------|
//! | [`WaitableTimeout`] | deadline passed (never, if zero) | timeout error |
//! | [`WaitableEvent`] | matching event notified | event payload |
//! | [`WaitableNever`] | never | - |
//! | [`WaitablePredicate`] | polled closure yields a value | that value |
//! | [`WaitableRace`] | any member done | first done member |
//! | [`WaitableFailure`] | failure event notified | the failure |
//! | [`WaitableReply`] | correlated reply arrived | reply result |
//!
//! # Contract
//!
//! - `is_done()` has no observable side effects, and stays `true` once
//!   it returned `true`.
//! - `get()` on a waitable that is not done returns
//!   [`Error::InvalidState`] instead of blocking.
//! - `dispose()` releases listener subscriptions and may be called any
//!   number of times.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::ListenerId;

use super::ListenerCollection;

// ============================================================================
// Constants
// ============================================================================

/// Default interval between two evaluations of a [`WaitablePredicate`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// Waitable Trait
// ============================================================================

/// A condition a blocking wait can suspend on.
pub trait Waitable<T>: Send {
    /// Returns `true` once the condition resolved.
    fn is_done(&self) -> bool;

    /// Returns the resolved value or failure.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidState`] if not done
    /// - the failure the waitable resolved to
    fn get(&self) -> Result<T>;

    /// Releases subscriptions. Idempotent.
    fn dispose(&self);

    /// Earliest instant at which the waitable may resolve without any
    /// frame arriving.
    ///
    /// The driver never blocks on the channel past this instant.
    fn wake_at(&self) -> Option<Instant> {
        None
    }
}

/// Boxed waitable, the unit of composition for races.
pub type BoxedWaitable<T> = Box<dyn Waitable<T>>;

/// Event filter used by [`WaitableEvent`].
pub type EventPredicate<P> = Box<dyn Fn(&P) -> bool + Send + Sync>;

fn not_done() -> Error {
    Error::invalid_state("waitable is not done")
}

// ============================================================================
// WaitableTimeout
// ============================================================================

/// Done once a wall-clock deadline passed; resolves to a timeout error.
///
/// A zero duration disables the timeout: the waitable then never
/// completes on its own, exactly like [`WaitableNever`].
pub struct WaitableTimeout<T> {
    deadline: Option<Instant>,
    timeout: Duration,
    operation: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> WaitableTimeout<T> {
    /// Creates a timeout starting now.
    ///
    /// A duration too large to represent as a deadline is treated as
    /// disabled.
    #[must_use]
    pub fn new(timeout: Duration, operation: impl Into<String>) -> Self {
        let deadline = if timeout.is_zero() {
            None
        } else {
            Instant::now().checked_add(timeout)
        };

        Self {
            deadline,
            timeout,
            operation: operation.into(),
            _marker: PhantomData,
        }
    }

    /// Returns `true` if the timeout can never fire.
    #[inline]
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.deadline.is_none()
    }
}

impl<T> fmt::Debug for WaitableTimeout<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitableTimeout")
            .field("timeout", &self.timeout)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

impl<T> Waitable<T> for WaitableTimeout<T> {
    fn is_done(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn get(&self) -> Result<T> {
        if !self.is_done() {
            return Err(not_done());
        }
        Err(Error::timeout(
            self.operation.clone(),
            u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        ))
    }

    fn dispose(&self) {}

    fn wake_at(&self) -> Option<Instant> {
        self.deadline
    }
}

// ============================================================================
// WaitableNever
// ============================================================================

/// Never completes.
#[derive(Debug)]
pub struct WaitableNever<T>(PhantomData<fn() -> T>);

impl<T> WaitableNever<T> {
    /// Creates a waitable that never completes.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for WaitableNever<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Waitable<T> for WaitableNever<T> {
    fn is_done(&self) -> bool {
        false
    }

    fn get(&self) -> Result<T> {
        Err(not_done())
    }

    fn dispose(&self) {}
}

// ============================================================================
// WaitableEvent
// ============================================================================

/// Done on the first notified payload accepted by the predicate.
pub struct WaitableEvent<T: Clone + Send + Sync + 'static> {
    listeners: Arc<ListenerCollection<T>>,
    event: String,
    listener_id: ListenerId,
    slot: Arc<Mutex<Option<T>>>,
    disposed: AtomicBool,
}

impl<T: Clone + Send + Sync + 'static> WaitableEvent<T> {
    /// Subscribes to `event` on `listeners`.
    ///
    /// Without a predicate the first notification completes the wait.
    pub fn new(
        listeners: &Arc<ListenerCollection<T>>,
        event: &str,
        predicate: Option<EventPredicate<T>>,
    ) -> Self {
        let slot = Arc::new(Mutex::new(None));
        let slot_clone = Arc::clone(&slot);

        let listener_id = listeners.add(event, move |payload: &T| {
            let mut slot = slot_clone.lock();
            if slot.is_none() && predicate.as_ref().is_none_or(|accept| accept(payload)) {
                *slot = Some(payload.clone());
            }
            Ok(())
        });

        Self {
            listeners: Arc::clone(listeners),
            event: event.to_string(),
            listener_id,
            slot,
            disposed: AtomicBool::new(false),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> fmt::Debug for WaitableEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitableEvent")
            .field("event", &self.event)
            .field("listener_id", &self.listener_id)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + Sync + 'static> Waitable<T> for WaitableEvent<T> {
    fn is_done(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn get(&self) -> Result<T> {
        self.slot.lock().clone().ok_or_else(not_done)
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.listeners.remove(&self.event, self.listener_id);
        }
    }
}

// ============================================================================
// WaitablePredicate
// ============================================================================

/// Done once a polled closure yields a value.
///
/// The closure runs whenever the driver checks for completion, which
/// happens after every frame and at least every poll interval.
pub struct WaitablePredicate<T> {
    poll: Box<dyn Fn() -> Option<T> + Send>,
    poll_interval: Duration,
    slot: Mutex<Option<T>>,
}

impl<T: Clone + Send> WaitablePredicate<T> {
    /// Creates a predicate polled every [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub fn new<F>(poll: F) -> Self
    where
        F: Fn() -> Option<T> + Send + 'static,
    {
        Self::with_interval(poll, DEFAULT_POLL_INTERVAL)
    }

    /// Creates a predicate with an explicit poll interval.
    #[must_use]
    pub fn with_interval<F>(poll: F, poll_interval: Duration) -> Self
    where
        F: Fn() -> Option<T> + Send + 'static,
    {
        Self {
            poll: Box::new(poll),
            poll_interval,
            slot: Mutex::new(None),
        }
    }
}

impl WaitablePredicate<()> {
    /// Creates a predicate from a boolean condition.
    #[must_use]
    pub fn condition<F>(condition: F, poll_interval: Duration) -> Self
    where
        F: Fn() -> bool + Send + 'static,
    {
        Self::with_interval(move || condition().then_some(()), poll_interval)
    }
}

impl<T: Clone + Send> Waitable<T> for WaitablePredicate<T> {
    fn is_done(&self) -> bool {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            *slot = (self.poll)();
        }
        slot.is_some()
    }

    fn get(&self) -> Result<T> {
        self.slot.lock().clone().ok_or_else(not_done)
    }

    fn dispose(&self) {}

    fn wake_at(&self) -> Option<Instant> {
        if self.slot.lock().is_some() {
            return None;
        }
        Instant::now().checked_add(self.poll_interval)
    }
}

// ============================================================================
// WaitableRace
// ============================================================================

/// Done when any member is done.
///
/// Members are evaluated in list order: when two resolve in the same pump
/// cycle, the earlier one wins. Resolving the race disposes every member.
pub struct WaitableRace<T> {
    members: Vec<BoxedWaitable<T>>,
    disposed: AtomicBool,
}

impl<T> WaitableRace<T> {
    /// Creates a race over `members`.
    #[must_use]
    pub fn new(members: Vec<BoxedWaitable<T>>) -> Self {
        Self {
            members,
            disposed: AtomicBool::new(false),
        }
    }

    /// Returns the number of members.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the race has no members.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T> fmt::Debug for WaitableRace<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitableRace")
            .field("members", &self.members.len())
            .field("disposed", &self.disposed.load(Ordering::Acquire))
            .finish()
    }
}

impl<T> Waitable<T> for WaitableRace<T> {
    fn is_done(&self) -> bool {
        self.members.iter().any(|member| member.is_done())
    }

    fn get(&self) -> Result<T> {
        let winner = self
            .members
            .iter()
            .find(|member| member.is_done())
            .ok_or_else(not_done)?;

        let result = winner.get();
        self.dispose();
        result
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            for member in &self.members {
                member.dispose();
            }
        }
    }

    fn wake_at(&self) -> Option<Instant> {
        self.members.iter().filter_map(|member| member.wake_at()).min()
    }
}

// ============================================================================
// WaitableFailure
// ============================================================================

/// Failure-only waitable: never yields a value.
///
/// Done once `event` is notified (connection closed, page crashed, ...);
/// `get()` then always fails with the configured error. Racing it against a
/// real waitable turns a close or crash into a structured error instead of
/// a hang.
pub struct WaitableFailure<T, P = Value> {
    subscription: Option<(Arc<ListenerCollection<P>>, String, ListenerId)>,
    fired: Arc<AtomicBool>,
    error: Box<dyn Fn() -> Error + Send + Sync>,
    disposed: AtomicBool,
    _marker: PhantomData<fn() -> T>,
}

impl<T, P: 'static> WaitableFailure<T, P> {
    /// Fails the wait once `event` is notified on `listeners`.
    pub fn on_event<E>(listeners: &Arc<ListenerCollection<P>>, event: &str, error: E) -> Self
    where
        E: Fn() -> Error + Send + Sync + 'static,
    {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_clone = Arc::clone(&fired);

        let listener_id = listeners.add(event, move |_: &P| {
            fired_clone.store(true, Ordering::Release);
            Ok(())
        });

        Self {
            subscription: Some((Arc::clone(listeners), event.to_string(), listener_id)),
            fired,
            error: Box::new(error),
            disposed: AtomicBool::new(false),
            _marker: PhantomData,
        }
    }

    /// Creates a failure that is already done.
    ///
    /// Used when the target is gone before the wait starts.
    pub fn fired<E>(error: E) -> Self
    where
        E: Fn() -> Error + Send + Sync + 'static,
    {
        Self {
            subscription: None,
            fired: Arc::new(AtomicBool::new(true)),
            error: Box::new(error),
            disposed: AtomicBool::new(false),
            _marker: PhantomData,
        }
    }
}

impl<T, P> Waitable<T> for WaitableFailure<T, P>
where
    P: Send + Sync + 'static,
{
    fn is_done(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    fn get(&self) -> Result<T> {
        if !self.is_done() {
            return Err(not_done());
        }
        Err((self.error)())
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel)
            && let Some((listeners, event, id)) = &self.subscription
        {
            listeners.remove(event, *id);
        }
    }
}

// ============================================================================
// WaitableReply
// ============================================================================

/// Completion slot of one outgoing request.
///
/// Filled by the pump when the correlated reply arrives, or with
/// [`Error::ConnectionClosed`] when the channel ends first.
#[derive(Default)]
pub struct ReplySlot {
    state: Mutex<ReplyState>,
}

#[derive(Default)]
struct ReplyState {
    done: bool,
    result: Option<Result<Value>>,
}

impl ReplySlot {
    /// Creates an empty slot.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the outcome. Later completions are ignored.
    pub fn complete(&self, result: Result<Value>) {
        let mut state = self.state.lock();
        if !state.done {
            state.done = true;
            state.result = Some(result);
        }
    }

    /// Returns `true` once completed.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.lock().done
    }
}

impl fmt::Debug for ReplySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplySlot")
            .field("done", &self.is_complete())
            .finish()
    }
}

/// Done once the correlated reply arrived.
///
/// Disposing an unanswered reply runs the abandon hook, which drops the
/// correlation entry: a reply arriving later is consumed and discarded.
pub struct WaitableReply {
    slot: Arc<ReplySlot>,
    abandon: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl WaitableReply {
    /// Waits on `slot`, running `abandon` if disposed before completion.
    pub fn new<F>(slot: Arc<ReplySlot>, abandon: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            slot,
            abandon: Mutex::new(Some(Box::new(abandon))),
        }
    }
}

impl Waitable<Value> for WaitableReply {
    fn is_done(&self) -> bool {
        self.slot.is_complete()
    }

    fn get(&self) -> Result<Value> {
        let mut state = self.slot.state.lock();
        if !state.done {
            return Err(not_done());
        }
        state
            .result
            .take()
            .unwrap_or_else(|| Err(Error::invalid_state("reply already consumed")))
    }

    fn dispose(&self) {
        let abandon = self.abandon.lock().take();
        if let Some(abandon) = abandon
            && !self.slot.is_complete()
        {
            abandon();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
