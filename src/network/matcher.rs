//! URL matchers.
//!
//! A [`UrlMatcher`] decides whether a request URL is selected by a route or
//! a wait. Glob and regex matchers can also be published to the remote end
//! as interception patterns; predicates cannot.
//!
//! # Example
//!
//! ```ignore
//! use conduit_driver::UrlMatcher;
//!
//! let images = UrlMatcher::glob("**/*.{png,jpg}")?;
//! let api = UrlMatcher::regex(r"/api/v\d+/", "i")?;
//! let slow = UrlMatcher::predicate(|url| url.contains("slow"));
//!
//! assert!(images.test("https://example.com/a/logo.png"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::InterceptionPattern;

use super::glob::{glob_to_regex_pattern, resolve_glob_base};

// ============================================================================
// UrlPredicate
// ============================================================================

/// Shared predicate closure, compared by identity.
#[derive(Clone)]
pub struct UrlPredicate(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl UrlPredicate {
    /// Wraps a closure.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(predicate))
    }

    /// Evaluates the predicate.
    #[inline]
    #[must_use]
    pub fn test(&self, url: &str) -> bool {
        (self.0)(url)
    }
}

impl PartialEq for UrlPredicate {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for UrlPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UrlPredicate")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

// ============================================================================
// UrlMatcher
// ============================================================================

/// Selects request URLs.
///
/// Immutable once built. Equality is structural for globs and regexes and
/// by identity for predicates, so a clone of the matcher passed to `route`
/// can be used to `unroute`.
#[derive(Clone, Debug)]
pub enum UrlMatcher {
    /// Glob pattern, optionally resolved against a base URL.
    Glob {
        /// Glob as given.
        glob: String,
        /// Base URL used for resolution.
        base_url: Option<Url>,
        /// Glob after base URL resolution.
        resolved: String,
        /// Compiled, anchored regex.
        regex: Regex,
    },

    /// Regular expression with JavaScript-style flags.
    Regex {
        /// Regex source.
        source: String,
        /// Flags (`i`, `m`, `s`, `x`, `g`, `u`).
        flags: String,
        /// Compiled regex.
        regex: Regex,
    },

    /// Arbitrary closure.
    Predicate(UrlPredicate),

    /// Matches every URL.
    Any,
}

// ============================================================================
// UrlMatcher - Constructors
// ============================================================================

impl UrlMatcher {
    /// Creates a glob matcher.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Regex`] if the compiled glob is not a valid regex
    /// (unbalanced braces).
    pub fn glob(glob: impl Into<String>) -> Result<Self> {
        Self::glob_with_base(glob, None)
    }

    /// Creates a glob matcher resolved against `base_url`.
    ///
    /// # Errors
    ///
    /// See [`UrlMatcher::glob`].
    pub fn glob_with_base(glob: impl Into<String>, base_url: Option<&Url>) -> Result<Self> {
        let glob = glob.into();
        let resolved = match base_url {
            Some(base) => resolve_glob_base(base, &glob),
            None => glob.clone(),
        };
        let regex = Regex::new(&glob_to_regex_pattern(&resolved))?;

        Ok(Self::Glob {
            glob,
            base_url: base_url.cloned(),
            resolved,
            regex,
        })
    }

    /// Creates a regex matcher.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] for unsupported flags
    /// - [`Error::Regex`] if `source` does not compile
    pub fn regex(source: impl Into<String>, flags: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let flags = flags.into();

        let mut builder = RegexBuilder::new(&source);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                // Global and unicode have no effect on a single test
                'g' | 'u' => &mut builder,
                other => {
                    return Err(Error::invalid_argument(format!(
                        "Unsupported regex flag '{other}' in \"{flags}\""
                    )));
                }
            };
        }
        let regex = builder.build()?;

        Ok(Self::Regex {
            source,
            flags,
            regex,
        })
    }

    /// Creates a predicate matcher.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(UrlPredicate::new(predicate))
    }

    /// Creates a matcher that accepts every URL.
    #[inline]
    #[must_use]
    pub fn any() -> Self {
        Self::Any
    }
}

// ============================================================================
// UrlMatcher - Matching
// ============================================================================

impl UrlMatcher {
    /// Returns `true` if `url` is selected.
    ///
    /// Globs match the whole URL; regexes match anywhere in it.
    #[must_use]
    pub fn test(&self, url: &str) -> bool {
        match self {
            Self::Glob { regex, .. } | Self::Regex { regex, .. } => regex.is_match(url),
            Self::Predicate(predicate) => predicate.test(url),
            Self::Any => true,
        }
    }

    /// Returns the matcher kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Glob { .. } => "glob",
            Self::Regex { .. } => "regex",
            Self::Predicate(_) => "predicate",
            Self::Any => "match-all",
        }
    }

    /// Converts to a remote interception pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMatcher`] for predicates and match-all,
    /// which the remote end cannot evaluate.
    pub fn to_pattern(&self) -> Result<InterceptionPattern> {
        match self {
            Self::Glob { resolved, .. } => Ok(InterceptionPattern::glob(resolved.clone())),
            Self::Regex { source, flags, .. } => {
                Ok(InterceptionPattern::regex(source.clone(), flags.clone()))
            }
            Self::Predicate(_) | Self::Any => Err(Error::unsupported_matcher(self.kind())),
        }
    }
}

impl PartialEq for UrlMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Glob {
                    glob: a,
                    base_url: base_a,
                    ..
                },
                Self::Glob {
                    glob: b,
                    base_url: base_b,
                    ..
                },
            ) => a == b && base_a == base_b,
            (
                Self::Regex {
                    source: a,
                    flags: flags_a,
                    ..
                },
                Self::Regex {
                    source: b,
                    flags: flags_b,
                    ..
                },
            ) => a == b && flags_a == flags_b,
            (Self::Predicate(a), Self::Predicate(b)) => a == b,
            (Self::Any, Self::Any) => true,
            _ => false,
        }
    }
}

impl fmt::Display for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Glob { resolved, .. } => write!(f, "{resolved}"),
            Self::Regex { source, flags, .. } => write!(f, "/{source}/{flags}"),
            Self::Predicate(_) => f.write_str("<predicate>"),
            Self::Any => f.write_str("<any>"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
