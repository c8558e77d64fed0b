//! Typed identifiers for timeline entities.
//!
//! Event ids are caller-supplied labels (e.g. `"_ub7"`), so [`EventId`] wraps
//! a `String` rather than generating anything. Segments are addressed by
//! their position in submission order through [`SegmentIndex`].

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Caller-supplied identifier of one event interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wrap a label as an event id.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Return the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(label: &str) -> Self {
        Self(label.to_owned())
    }
}

impl From<String> for EventId {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EventId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// 0-based position of a segment in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentIndex(usize);

impl SegmentIndex {
    /// Wrap a raw position.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the raw position.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// The index of the segment that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SegmentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for SegmentIndex {
    fn from(index: usize) -> Self {
        Self(index)
    }
}
