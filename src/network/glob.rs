//! URL glob compilation.
//!
//! | Glob | Regex | Matches |
//! |------|-------|---------|
//! | `*` | `([^/]*)` | one path segment or part of one |
//! | `**` (bounded by `/` or the ends) | `((?:[^/]*(?:/|$))*)` | any number of segments |
//! | `?` | `.` | exactly one character |
//! | `{a,b}` | `(a\|b)` | either alternative |
//! | `\x` | `\x` or `x` | `x` literally |
//!
//! Everything else matches itself. The result is anchored on both ends.

// ============================================================================
// Imports
// ============================================================================

use tracing::trace;
use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// Characters that must be escaped to match literally.
const ESCAPED_CHARS: &[char] = &[
    '$', '^', '+', '.', '*', '(', ')', '|', '\\', '?', '{', '}', '[', ']',
];

/// Expansion of a `**` segment.
const DEEP_WILDCARD: &str = "((?:[^/]*(?:/|$))*)";

/// Expansion of a `*`.
const SEGMENT_WILDCARD: &str = "([^/]*)";

// ============================================================================
// Compilation
// ============================================================================

/// Compiles a glob into an anchored regular expression source.
#[must_use]
pub fn glob_to_regex_pattern(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    let mut in_group = false;

    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() {
            i += 1;
            push_literal(&mut out, chars[i]);
            i += 1;
            continue;
        }

        if c == '*' {
            let before = i.checked_sub(1).map(|j| chars[j]);
            let mut stars = 1;
            while chars.get(i + 1) == Some(&'*') {
                stars += 1;
                i += 1;
            }
            let after = chars.get(i + 1).copied();

            let bounded_before = before.is_none_or(|ch| ch == '/');
            let bounded_after = after.is_none_or(|ch| ch == '/');

            if stars > 1 && bounded_before && bounded_after {
                out.push_str(DEEP_WILDCARD);
                // The trailing '/' is part of the expansion
                i += 1;
            } else {
                out.push_str(SEGMENT_WILDCARD);
            }
            i += 1;
            continue;
        }

        match c {
            '?' => out.push('.'),
            '{' => {
                in_group = true;
                out.push('(');
            }
            '}' => {
                in_group = false;
                out.push(')');
            }
            ',' if in_group => out.push('|'),
            _ => push_literal(&mut out, c),
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Appends `c`, escaped if it is a regex metacharacter.
fn push_literal(out: &mut String, c: char) {
    if ESCAPED_CHARS.contains(&c) {
        out.push('\\');
    }
    out.push(c);
}

// ============================================================================
// Base URL Resolution
// ============================================================================

/// Resolves a relative glob against a base URL.
///
/// Globs starting with `*` are returned unchanged, as are globs the URL
/// parser rejects. Wildcards survive resolution: every path token is
/// swapped for a placeholder before joining and restored afterwards.
#[must_use]
pub fn resolve_glob_base(base_url: &Url, glob: &str) -> String {
    if glob.starts_with('*') {
        return glob.to_string();
    }

    let mut placeholders: Vec<(String, String)> = Vec::new();
    let mut map_token = |original: &str, replacement: String| -> String {
        if original.is_empty() {
            return String::new();
        }
        placeholders.push((replacement.clone(), original.to_string()));
        replacement
    };

    let relative = glob
        .split('/')
        .enumerate()
        .map(|(index, token)| {
            if token.is_empty() || token == "." || token == ".." {
                return token.to_string();
            }
            // Scheme wildcards such as `http*:` must stay a web scheme
            if index == 0 && token.ends_with(':') {
                return map_token(token, "http:".to_string());
            }
            match token.find('?') {
                None => map_token(token, format!("$_{index}_$")),
                Some(split) => {
                    let prefix = map_token(&token[..split], format!("$_{index}_$"));
                    let suffix = map_token(&token[split..], format!("?$_{index}_$"));
                    prefix + &suffix
                }
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    let Ok(resolved) = base_url.join(&relative) else {
        trace!(glob, "Glob not resolvable against base URL");
        return glob.to_string();
    };

    let mut resolved = resolved.to_string();
    for (placeholder, original) in &placeholders {
        resolved = resolved.replacen(placeholder.as_str(), original, 1);
    }
    resolved
}

// ============================================================================
// Tests
// ============================================================================
