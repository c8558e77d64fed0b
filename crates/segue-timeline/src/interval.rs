//! Half-open interval math and absolute/relative offset conversion.

use serde::{Deserialize, Serialize};

/// A half-open time range `[start, end)` in seconds.
///
/// The same shape is used for segment-relative bounds (as ingested) and for
/// absolute timeline bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// `start <= t < end`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Whether both bounds are finite and `start < end`.
    #[inline]
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start < self.end
    }

    /// Shift both bounds by `delta`.
    #[inline]
    pub fn offset_by(&self, delta: f64) -> Span {
        Span::new(self.start + delta, self.end + delta)
    }

    /// Whether the two half-open ranges share any instant.
    #[inline]
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Seconds left until `end`, clamped at zero.
    #[inline]
    pub fn remaining_from(&self, t: f64) -> f64 {
        (self.end - t).max(0.0)
    }
}

/// Convert an absolute time to a time relative to a segment starting at
/// `segment_start`.
#[inline]
pub fn to_relative(absolute: f64, segment_start: f64) -> f64 {
    absolute - segment_start
}

/// Convert a segment-relative time to an absolute timeline time.
#[inline]
pub fn to_absolute(relative: f64, segment_start: f64) -> f64 {
    segment_start + relative
}
