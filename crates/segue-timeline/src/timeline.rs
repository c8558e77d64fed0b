//! The combined timeline: segments laid end to end, and every event
//! interval converted to absolute coordinates.
//!
//! A [`Timeline`] is append-only. Each successful
//! [`add_segment`](Timeline::add_segment) places one media file directly
//! after the previous one, so after N segments the timeline covers
//! `[0, total_length)` without gaps or overlaps. Once built it is read-only
//! and can be shared behind an `Arc` by any number of schedulers.

use segue_core::{Error, EventId, Result, SegmentIndex};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use crate::index::{EventIndex, IndexEntry};
use crate::interval::Span;
use crate::timing::{url_hint, SegmentDefinition};
use serde_json::value::RawValue;

/// One media file placed on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub url: String,
    pub index: SegmentIndex,
    /// Absolute offset of the first instant of this segment.
    pub start: f64,
    /// Length as submitted.
    pub length: f64,
    /// `start + length`; equal to the next segment's `start`.
    pub end: f64,
    /// Positions of this segment's events in the interval list.
    events: Range<usize>,
}

impl Segment {
    /// The absolute `[start, end)` range.
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// Number of events in this segment.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// A named interval in absolute coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInterval {
    pub id: EventId,
    /// Absolute `[start, end)`.
    pub span: Span,
    /// Bounds relative to the owning segment, exactly as ingested.
    pub relative: Span,
    pub segment: SegmentIndex,
}

impl EventInterval {
    pub fn start(&self) -> f64 {
        self.span.start
    }

    pub fn end(&self) -> f64 {
        self.span.end
    }
}

/// Result of an id lookup.
#[derive(Debug, Clone, Copy)]
pub struct EventEntry<'a> {
    pub interval: &'a EventInterval,
    pub segment: &'a Segment,
}

/// A segment that [`Timeline::from_definitions`] or [`Timeline::from_json`]
/// refused to ingest.
#[derive(Debug)]
pub struct Rejection {
    /// Position of the definition in the submitted list.
    pub position: usize,
    pub url: String,
    pub error: Error,
}

impl Rejection {
    fn new(position: usize, url: String, error: Error) -> Self {
        tracing::warn!(position, url = %url, "Rejected segment: {error}");
        Self {
            position,
            url,
            error,
        }
    }
}

/// Ordered segments, ordered intervals, and the id index over them.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    segments: Vec<Segment>,
    intervals: Vec<EventInterval>,
    index: EventIndex,
    urls: HashMap<String, SegmentIndex>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline from a whole timing array.
    ///
    /// Bad segments are skipped and reported; the ones that pass are laid
    /// out in order as if the rejected ones had never been submitted.
    pub fn from_definitions(
        defs: impl IntoIterator<Item = SegmentDefinition>,
    ) -> (Self, Vec<Rejection>) {
        let mut timeline = Self::new();
        let mut rejections = Vec::new();

        for (position, def) in defs.into_iter().enumerate() {
            let url = def.url.clone();
            if let Err(error) = timeline.add_segment(def) {
                rejections.push(Rejection::new(position, url, error));
            }
        }

        (timeline, rejections)
    }

    /// Decode a JSON timing array and build a timeline from it.
    ///
    /// Only a document that is not an array at all fails outright; each
    /// element is decoded on its own, so one bad object is reported as a
    /// rejection like any other bad segment.
    pub fn from_json(json_str: &str) -> Result<(Self, Vec<Rejection>)> {
        let raw: Vec<&RawValue> = serde_json::from_str(json_str)
            .map_err(|e| Error::malformed(format!("timing array parse error: {e}")))?;

        let mut timeline = Self::new();
        let mut rejections = Vec::new();

        for (position, raw) in raw.into_iter().enumerate() {
            let result = SegmentDefinition::from_json(raw.get())
                .map_err(|error| (url_hint(raw.get()), error))
                .and_then(|def| {
                    let url = def.url.clone();
                    timeline.add_segment(def).map_err(|error| (url, error))
                });
            if let Err((url, error)) = result {
                rejections.push(Rejection::new(position, url, error));
            }
        }

        Ok((timeline, rejections))
    }

    /// Append one segment after the current end of the timeline.
    ///
    /// All-or-nothing: on error the timeline is left exactly as it was.
    pub fn add_segment(&mut self, def: SegmentDefinition) -> Result<SegmentIndex> {
        let events = def.validate()?;

        if self.urls.contains_key(&def.url) {
            return Err(Error::malformed(format!(
                "segment url {} is already on the timeline",
                def.url
            )));
        }
        for (id, _) in &events {
            if self.index.contains(id.as_str()) {
                return Err(Error::DuplicateEventId((*id).clone()));
            }
        }

        let offset = self.total_length();
        let index = SegmentIndex::new(self.segments.len());
        if offset + def.length_seconds <= offset {
            return Err(Error::malformed(format!(
                "segment {} loses ordering at absolute offset {offset}",
                def.url
            )));
        }

        // Offsetting can collapse or reorder bounds that were only
        // distinguishable at segment-relative precision.
        let mut placed: Vec<EventInterval> = Vec::with_capacity(events.len());
        for (id, relative) in events {
            let span = relative.offset_by(offset);
            if !span.is_well_formed() || placed.last().is_some_and(|prev| span.start < prev.end())
            {
                return Err(Error::malformed(format!(
                    "event {id} in {} loses ordering at absolute offset {offset}",
                    def.url
                )));
            }
            placed.push(EventInterval {
                id: id.clone(),
                span,
                relative,
                segment: index,
            });
        }

        let first = self.intervals.len();
        for interval in placed {
            self.index.insert(
                interval.id.clone(),
                IndexEntry {
                    position: self.intervals.len(),
                    segment: index,
                },
            );
            self.intervals.push(interval);
        }

        let segment = Segment {
            url: def.url,
            index,
            start: offset,
            length: def.length_seconds,
            end: offset + def.length_seconds,
            events: first..self.intervals.len(),
        };
        tracing::info!(
            url = %segment.url,
            index = %index,
            start = segment.start,
            end = segment.end,
            events = segment.event_count(),
            "Added segment"
        );
        self.urls.insert(segment.url.clone(), index);
        self.segments.push(segment);

        Ok(index)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Every interval, ordered by start.
    pub fn intervals(&self) -> &[EventInterval] {
        &self.intervals
    }

    pub fn index(&self) -> &EventIndex {
        &self.index
    }

    pub fn segment(&self, index: SegmentIndex) -> Option<&Segment> {
        self.segments.get(index.get())
    }

    /// The intervals owned by one segment, ordered by start.
    pub fn segment_events(&self, index: SegmentIndex) -> &[EventInterval] {
        self.segment(index)
            .map(|segment| &self.intervals[segment.events.clone()])
            .unwrap_or(&[])
    }

    pub fn segment_by_url(&self, url: &str) -> Option<&Segment> {
        self.urls.get(url).and_then(|index| self.segment(*index))
    }

    /// Urls of every segment in timeline order.
    pub fn segment_urls(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.url.as_str()).collect()
    }

    pub fn segment_length(&self, url: &str) -> Option<f64> {
        self.segment_by_url(url).map(|s| s.length)
    }

    pub fn segment_start(&self, url: &str) -> Option<f64> {
        self.segment_by_url(url).map(|s| s.start)
    }

    /// Sum of all segment lengths (end of the last segment).
    pub fn total_length(&self) -> f64 {
        self.segments.last().map_or(0.0, |s| s.end)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    // -----------------------------------------------------------------------
    // Event index
    // -----------------------------------------------------------------------

    /// Resolve an id to its interval and owning segment.
    pub fn lookup(&self, id: &str) -> Option<EventEntry<'_>> {
        let entry = self.index.get(id)?;
        Some(EventEntry {
            interval: self.intervals.get(entry.position)?,
            segment: self.segments.get(entry.segment.get())?,
        })
    }

    /// Absolute start of the event `id`.
    pub fn event_start(&self, id: &str) -> Option<f64> {
        self.lookup(id).map(|entry| entry.interval.start())
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Rebuild the ingestion shape of one segment with relative bounds.
    pub fn timing_for(&self, url: &str) -> Option<SegmentDefinition> {
        let segment = self.segment_by_url(url)?;
        Some(self.definition_of(segment))
    }

    /// Rebuild the ingestion shape of every segment, in order.
    pub fn timing_array(&self) -> Vec<SegmentDefinition> {
        self.segments
            .iter()
            .map(|segment| self.definition_of(segment))
            .collect()
    }

    fn definition_of(&self, segment: &Segment) -> SegmentDefinition {
        let times: BTreeMap<EventId, Span> = self.intervals[segment.events.clone()]
            .iter()
            .map(|interval| (interval.id.clone(), interval.relative))
            .collect();
        SegmentDefinition {
            url: segment.url.clone(),
            length_seconds: segment.length,
            times,
        }
    }
}
