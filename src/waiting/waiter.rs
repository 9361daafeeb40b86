//! Race builder for "wait for X" calls.
//!
//! Every typed wait is the same race: the awaited condition first, then the
//! failure conditions that would make it unreachable, then the timeout.
//!
//! ```ignore
//! let race = Waiter::new()
//!     .wait_for(WaitableEvent::new(&listeners, "request", None))
//!     .reject_on(connection.closed_waitable())
//!     .timeout(Duration::from_secs(30), "waiting for event \"request\"")
//!     .into_race();
//!
//! let payload = connection.run_until(|| Ok(()), &race)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use super::waitable::{BoxedWaitable, Waitable, WaitableRace, WaitableTimeout};

// ============================================================================
// Waiter
// ============================================================================

/// Ordered collection of race members.
pub struct Waiter<T> {
    /// Awaited conditions.
    targets: Vec<BoxedWaitable<T>>,
    /// Failure conditions.
    rejections: Vec<BoxedWaitable<T>>,
    /// Timeout member, always last.
    timeout: Option<BoxedWaitable<T>>,
}

impl<T: 'static> Default for Waiter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Waiter<T> {
    /// Creates an empty waiter.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            rejections: Vec::new(),
            timeout: None,
        }
    }

    /// Adds an awaited condition.
    #[must_use]
    pub fn wait_for(mut self, waitable: impl Waitable<T> + 'static) -> Self {
        self.targets.push(Box::new(waitable));
        self
    }

    /// Adds a failure condition.
    #[must_use]
    pub fn reject_on(mut self, waitable: impl Waitable<T> + 'static) -> Self {
        self.rejections.push(Box::new(waitable));
        self
    }

    /// Sets the timeout. Zero disables it.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration, operation: impl Into<String>) -> Self {
        self.timeout = Some(Box::new(WaitableTimeout::new(timeout, operation)));
        self
    }

    /// Builds the race: targets, then rejections, then the timeout.
    #[must_use]
    pub fn into_race(self) -> WaitableRace<T> {
        let mut members = self.targets;
        members.extend(self.rejections);
        members.extend(self.timeout);
        WaitableRace::new(members)
    }
}

// ============================================================================
// Tests
// ============================================================================
