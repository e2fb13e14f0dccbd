//! Materialized paths for the location hierarchy.
//!
//! A location's place in the tree is its path: the normalized segments of
//! every ancestor followed by its own, joined with [`SEPARATOR`]. Parent and
//! child relations are never stored separately; they are read off the path.
//!
//! Segments only ever contain `[a-z0-9_]`, so the separator cannot occur
//! inside one, and `'/'` (the byte after `'.'`) bounds every descendant
//! range under bytewise (`COLLATE "C"`) ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Deepest level a location may occupy.
pub const MAX_DEPTH: usize = 5;

/// Joins segments inside a path.
pub const SEPARATOR: char = '.';

/// Segment used when a name normalizes to nothing.
pub const PLACEHOLDER_SEGMENT: &str = "location";

const WORD_JOINER: char = '_';

/// Turn a display name into a path segment.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `_`, and trims `_` from both ends. Idempotent.
pub fn normalize(name: &str) -> String {
    let mut segment = String::with_capacity(name.len());
    let mut pending_joiner = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_joiner && !segment.is_empty() {
                segment.push(WORD_JOINER);
            }
            pending_joiner = false;
            segment.push(ch);
        } else {
            pending_joiner = true;
        }
    }

    if segment.is_empty() {
        PLACEHOLDER_SEGMENT.to_string()
    } else {
        segment
    }
}

/// A validated location path of 1 to [`MAX_DEPTH`] segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationPath(String);

impl LocationPath {
    /// Append `segment` to `parent`, or start a new root when there is none.
    ///
    /// Fails with `MaxDepthExceeded` when the result would be deeper than
    /// [`MAX_DEPTH`].
    pub fn compose(parent: Option<&LocationPath>, segment: &str) -> Result<Self, AppError> {
        let segment = normalize(segment);
        let Some(parent) = parent else {
            return Ok(Self(segment));
        };

        let depth = parent.depth() + 1;
        if depth > MAX_DEPTH {
            return Err(AppError::max_depth_exceeded(format!(
                "Locations can be nested at most {MAX_DEPTH} levels deep"
            )));
        }
        Ok(Self(format!("{}{SEPARATOR}{segment}", parent.0)))
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        depth_of(&self.0)
    }

    /// The path string as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The node's own segment.
    pub fn last_segment(&self) -> &str {
        self.0
            .rsplit_once(SEPARATOR)
            .map_or(self.0.as_str(), |(_, last)| last)
    }

    /// The parent path, or `None` at the root.
    pub fn parent(&self) -> Option<LocationPath> {
        self.0
            .rsplit_once(SEPARATOR)
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// Every proper ancestor, root first.
    pub fn ancestors(&self) -> Vec<LocationPath> {
        let mut out = Vec::with_capacity(self.depth().saturating_sub(1));
        let mut current = self.parent();
        while let Some(path) = current {
            current = path.parent();
            out.push(path);
        }
        out.reverse();
        out
    }

    /// Same parent, different final segment.
    pub fn with_last_segment(&self, name: &str) -> LocationPath {
        let segment = normalize(name);
        match self.0.rsplit_once(SEPARATOR) {
            Some((parent, _)) => Self(format!("{parent}{SEPARATOR}{segment}")),
            None => Self(segment),
        }
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &LocationPath) -> bool {
        other.0.len() > self.0.len()
            && other.0.starts_with(&self.0)
            && other.0[self.0.len()..].starts_with(SEPARATOR)
    }

    /// Replace the `old` prefix of this path with `new`.
    ///
    /// Returns `None` when `old` is neither this path nor one of its
    /// ancestors, or when the result would exceed [`MAX_DEPTH`].
    pub fn rebase(&self, old: &LocationPath, new: &LocationPath) -> Option<LocationPath> {
        if self == old {
            return Some(new.clone());
        }
        if !old.is_ancestor_of(self) {
            return None;
        }
        let rebased = Self(format!("{}{}", new.0, &self.0[old.0.len()..]));
        (rebased.depth() <= MAX_DEPTH).then_some(rebased)
    }

    /// Half-open bounds `[lower, upper)` containing exactly the descendants.
    pub fn descendant_range(&self) -> (String, String) {
        (format!("{}.", self.0), format!("{}/", self.0))
    }
}

/// Number of segments in a stored path string.
pub fn depth_of(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.matches(SEPARATOR).count() + 1
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LocationPath {
    type Err = AppError;

    /// Parse a stored path, rejecting anything that is not already in
    /// normalized form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let depth = depth_of(s);
        if depth == 0 {
            return Err(AppError::validation("Location path cannot be empty"));
        }
        if depth > MAX_DEPTH {
            return Err(AppError::max_depth_exceeded(format!(
                "Path '{s}' is deeper than {MAX_DEPTH} levels"
            )));
        }
        if s.split(SEPARATOR).any(|segment| normalize(segment) != segment) {
            return Err(AppError::validation(format!(
                "Path '{s}' contains a segment that is not normalized"
            )));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for LocationPath {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LocationPath> for String {
    fn from(path: LocationPath) -> Self {
        path.0
    }
}
