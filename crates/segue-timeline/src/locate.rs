//! Time Locator: absolute time to owning segment and active event.
//!
//! Both segments and intervals are stored sorted by `start` and never
//! overlap, so a binary search for the last element starting at or before
//! `t` finds the only candidate; a containment check then confirms it.
//! If those invariants were broken the result would be undefined, which is
//! why [`Timeline::add_segment`] refuses any input that would break them.

use crate::interval::{to_relative, Span};
use crate::timeline::{EventInterval, Segment, Timeline};

/// Index of the element whose half-open span contains `t`.
///
/// `items` must be sorted by start with non-overlapping spans.
fn search<T>(items: &[T], t: f64, span: impl Fn(&T) -> Span) -> Option<usize> {
    if t.is_nan() {
        return None;
    }
    let after = items.partition_point(|item| span(item).start <= t);
    let candidate = after.checked_sub(1)?;
    span(&items[candidate]).contains(t).then_some(candidate)
}

impl Timeline {
    /// The interval containing absolute time `t`, or `None` when `t` sits in
    /// a gap between events or outside the timeline.
    pub fn locate(&self, t: f64) -> Option<&EventInterval> {
        let intervals = self.intervals();
        search(intervals, t, |interval| interval.span).map(|i| &intervals[i])
    }

    /// The segment containing absolute time `t`.
    pub fn segment_for(&self, t: f64) -> Option<&Segment> {
        let segments = self.segments();
        search(segments, t, Segment::span).map(|i| &segments[i])
    }

    /// The first interval starting strictly after `t`.
    pub fn next_event_after(&self, t: f64) -> Option<&EventInterval> {
        if t.is_nan() {
            return None;
        }
        let intervals = self.intervals();
        let after = intervals.partition_point(|interval| interval.start() <= t);
        intervals.get(after)
    }

    /// Split absolute time `t` into its segment and the offset inside it.
    pub fn to_relative_time(&self, t: f64) -> Option<(&Segment, f64)> {
        let segment = self.segment_for(t)?;
        Some((segment, to_relative(t, segment.start)))
    }
}
