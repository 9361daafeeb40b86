//! Client configuration and timeout resolution.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use conduit_driver::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_timeout(Duration::from_secs(10))
//!     .with_poll_interval(Duration::from_millis(50));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use url::Url;

use crate::waiting::DEFAULT_POLL_INTERVAL;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for waits and requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on requests awaiting a reply.
pub const DEFAULT_MAX_PENDING_REQUESTS: usize = 100;

// ============================================================================
// ClientOptions
// ============================================================================

/// Connection-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Default timeout. Zero waits indefinitely.
    pub timeout: Duration,

    /// Interval at which predicate waits are re-evaluated.
    pub poll_interval: Duration,

    /// Maximum number of requests awaiting a reply.
    pub max_pending_requests: usize,

    /// Base URL against which relative glob patterns are resolved.
    pub base_url: Option<Url>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_pending_requests: DEFAULT_MAX_PENDING_REQUESTS,
            base_url: None,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the default timeout.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the predicate poll interval.
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the pending request cap.
    #[inline]
    #[must_use]
    pub fn with_max_pending_requests(mut self, max: usize) -> Self {
        self.max_pending_requests = max;
        self
    }

    /// Sets the base URL for relative globs.
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Validates the options configuration.
    ///
    /// # Errors
    ///
    /// Returns error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval.is_zero() {
            return Err("Poll interval must be greater than zero".to_string());
        }
        if self.max_pending_requests == 0 {
            return Err("Max pending requests must be greater than zero".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// TimeoutSettings
// ============================================================================

/// Default timeout of one object, falling back to its parent.
///
/// Pages chain to their context, contexts to the client options.
#[derive(Debug, Clone)]
pub struct TimeoutSettings {
    own: Arc<Mutex<Option<Duration>>>,
    parent: Option<Box<TimeoutSettings>>,
    fallback: Duration,
}

impl TimeoutSettings {
    /// Creates a root settings object resolving to `fallback`.
    #[must_use]
    pub fn new(fallback: Duration) -> Self {
        Self {
            own: Arc::new(Mutex::new(None)),
            parent: None,
            fallback,
        }
    }

    /// Creates settings that defer to `parent` until overridden.
    #[must_use]
    pub fn child_of(parent: &TimeoutSettings) -> Self {
        Self {
            own: Arc::new(Mutex::new(None)),
            parent: Some(Box::new(parent.clone())),
            fallback: parent.fallback,
        }
    }

    /// Overrides the default timeout for this object and its children.
    pub fn set_default_timeout(&self, timeout: Duration) {
        *self.own.lock() = Some(timeout);
    }

    /// Resolves the timeout of one call.
    ///
    /// An explicit value wins, then this object's default, then the
    /// parent chain.
    #[must_use]
    pub fn timeout(&self, explicit: Option<Duration>) -> Duration {
        if let Some(timeout) = explicit {
            return timeout;
        }
        if let Some(timeout) = *self.own.lock() {
            return timeout;
        }
        match &self.parent {
            Some(parent) => parent.timeout(None),
            None => self.fallback,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.poll_interval, Duration::from_millis(100));
        assert_eq!(options.max_pending_requests, 100);
        assert!(options.base_url.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let base = Url::parse("https://example.com/app/").expect("url");
        let options = ClientOptions::new()
            .with_timeout(Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(10))
            .with_max_pending_requests(4)
            .with_base_url(base.clone());

        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.poll_interval, Duration::from_millis(10));
        assert_eq!(options.max_pending_requests, 4);
        assert_eq!(options.base_url, Some(base));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(ClientOptions::new().with_poll_interval(Duration::ZERO).validate().is_err());
        assert!(ClientOptions::new().with_max_pending_requests(0).validate().is_err());
    }

    #[test]
    fn test_timeout_chain() {
        let client = TimeoutSettings::new(Duration::from_secs(30));
        let context = TimeoutSettings::child_of(&client);
        let page = TimeoutSettings::child_of(&context);

        assert_eq!(page.timeout(None), Duration::from_secs(30));

        context.set_default_timeout(Duration::from_secs(7));
        assert_eq!(page.timeout(None), Duration::from_secs(7));

        page.set_default_timeout(Duration::from_secs(2));
        assert_eq!(page.timeout(None), Duration::from_secs(2));
        assert_eq!(context.timeout(None), Duration::from_secs(7));

        assert_eq!(page.timeout(Some(Duration::ZERO)), Duration::ZERO);
    }
}
