//! Client entry point and configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Connection owner, creates contexts and pages |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientOptions`] | Timeouts, polling, base URL |
//! | [`TimeoutSettings`] | Per-object default timeout chain |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Core client implementation.
pub mod core;

/// Client options and timeout resolution.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use core::Client;
pub use options::{ClientOptions, DEFAULT_MAX_PENDING_REQUESTS, DEFAULT_TIMEOUT, TimeoutSettings};
