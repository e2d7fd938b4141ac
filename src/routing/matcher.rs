//! Route matching logic.
//!
//! # Responsibilities
//! - Match exact paths and `{param}` patterns segment by segment
//! - Match mount prefixes on segment boundaries
//! - Extract path parameters
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A trailing slash is significant; normalization happens before routing
//! - No regex to guarantee O(n) matching

use std::collections::BTreeMap;

/// Outcome of a successful match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathMatch {
    pub params: BTreeMap<String, String>,
}

/// Trait for matching a route path against a condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns the extracted parameters if `path` matches.
    fn matches(&self, path: &str) -> Option<PathMatch>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Matches a full path such as `/{identity}/details/{pk}`.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    segments: Vec<Segment>,
    trailing_slash: bool,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Self {
        let trimmed = pattern.trim_start_matches('/');
        let trailing_slash = trimmed.ends_with('/');
        let segments = trimmed
            .trim_end_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        Self {
            segments,
            trailing_slash,
        }
    }
}

impl Matcher for PatternMatcher {
    fn matches(&self, path: &str) -> Option<PathMatch> {
        let rest = path.strip_prefix('/')?;
        if self.segments.is_empty() {
            return rest.is_empty().then(PathMatch::default);
        }

        let has_trailing = rest.ends_with('/');
        if has_trailing != self.trailing_slash {
            return None;
        }
        let parts: Vec<&str> = rest.trim_end_matches('/').split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut found = PathMatch::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(expected) if expected == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    found.params.insert(name.clone(), part.to_string());
                }
                _ => return None,
            }
        }
        Some(found)
    }
}

/// Matches everything at or below a mount prefix.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    /// The prefix is stored without its trailing slash.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for PrefixMatcher {
    fn matches(&self, path: &str) -> Option<PathMatch> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        (rest.is_empty() || rest.starts_with('/')).then(PathMatch::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_matcher_root() {
        let matcher = PatternMatcher::new("/");
        assert!(matcher.matches("/").is_some());
        assert!(matcher.matches("/users").is_none());
        assert!(matcher.matches("").is_none());
    }

    #[test]
    fn test_pattern_matcher_params() {
        let matcher = PatternMatcher::new("/{identity}/details/{pk}");

        let found = matcher.matches("/user/details/42").unwrap();
        assert_eq!(found.params["identity"], "user");
        assert_eq!(found.params["pk"], "42");

        assert!(matcher.matches("/user/details/42/").is_none());
        assert!(matcher.matches("/user/list/42").is_none());
        assert!(matcher.matches("/user/details").is_none());
    }

    #[test]
    fn test_pattern_matcher_trailing_slash_is_significant() {
        let matcher = PatternMatcher::new("/login/");
        assert!(matcher.matches("/login/").is_some());
        assert!(matcher.matches("/login").is_none());
    }

    #[test]
    fn test_prefix_matcher() {
        let matcher = PrefixMatcher::new("/admin/");
        assert_eq!(matcher.prefix(), "/admin");

        assert!(matcher.matches("/admin").is_some());
        assert!(matcher.matches("/admin/").is_some());
        assert!(matcher.matches("/admin/user/list").is_some());
        assert!(matcher.matches("/administrator").is_none());
        assert!(matcher.matches("/other").is_none());
    }
}
