//! Per-segment timing definitions: the ingestion and export format.
//!
//! A timing array is a JSON list of objects shaped like:
//!
//! ```json
//! {
//!   "url": "http://media_file_url.mp4",
//!   "length_seconds": 4542.51,
//!   "times": {
//!     "_ub6": { "start": 0.000, "end": 1.000 },
//!     "_ub7": { "start": 1.000, "end": 1.280 }
//!   }
//! }
//! ```
//!
//! Event bounds are relative to the start of their own segment.

use segue_core::{Error, EventId, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::btree_map::{BTreeMap, Entry};
use std::fmt;

use crate::interval::Span;

/// One segment as submitted to (or exported from) the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentDefinition {
    pub url: String,
    pub length_seconds: f64,
    #[serde(default, deserialize_with = "unique_times")]
    pub times: BTreeMap<EventId, Span>,
}

/// Decode `times`, refusing an id that appears twice in one object.
fn unique_times<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<BTreeMap<EventId, Span>, D::Error> {
    struct UniqueTimes;

    impl<'de> Visitor<'de> for UniqueTimes {
        type Value = BTreeMap<EventId, Span>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of event id to {start, end}")
        }

        fn visit_map<M: MapAccess<'de>>(
            self,
            mut map: M,
        ) -> std::result::Result<Self::Value, M::Error> {
            let mut times = BTreeMap::new();
            while let Some((id, span)) = map.next_entry::<EventId, Span>()? {
                match times.entry(id) {
                    Entry::Occupied(taken) => {
                        return Err(de::Error::custom(format!(
                            "duplicate event id {}",
                            taken.key()
                        )));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(span);
                    }
                }
            }
            Ok(times)
        }
    }

    deserializer.deserialize_map(UniqueTimes)
}

/// Best-effort url of a segment object that failed to decode.
pub(crate) fn url_hint(json_str: &str) -> String {
    #[derive(Deserialize)]
    struct UrlHint {
        #[serde(default)]
        url: String,
    }

    serde_json::from_str::<UrlHint>(json_str)
        .map(|hint| hint.url)
        .unwrap_or_default()
}

impl SegmentDefinition {
    pub fn new(url: impl Into<String>, length_seconds: f64) -> Self {
        Self {
            url: url.into(),
            length_seconds,
            times: BTreeMap::new(),
        }
    }

    /// Builder-style helper for adding one relative event.
    pub fn with_event(mut self, id: impl Into<EventId>, start: f64, end: f64) -> Self {
        self.times.insert(id.into(), Span::new(start, end));
        self
    }

    /// Decode a single definition from JSON.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::malformed(format!("timing object parse error: {e}")))
    }

    /// Check the shape and values of this definition on its own.
    ///
    /// Returns the events sorted by relative start. Checks that need the
    /// rest of the timeline (duplicate ids, duplicate urls) happen in
    /// [`Timeline::add_segment`](crate::Timeline::add_segment).
    pub fn validate(&self) -> Result<Vec<(&EventId, Span)>> {
        if self.url.trim().is_empty() {
            return Err(Error::malformed("segment url is empty"));
        }
        if !self.length_seconds.is_finite() || self.length_seconds <= 0.0 {
            return Err(Error::malformed(format!(
                "segment {} has invalid length_seconds {}",
                self.url, self.length_seconds
            )));
        }

        for (id, span) in &self.times {
            if !span.is_well_formed() {
                return Err(Error::malformed(format!(
                    "event {id} in {} needs finite start < end, got [{}, {})",
                    self.url, span.start, span.end
                )));
            }
            if span.start < 0.0 {
                return Err(Error::malformed(format!(
                    "event {id} in {} starts before the segment ({})",
                    self.url, span.start
                )));
            }
            if span.end > self.length_seconds {
                return Err(Error::malformed(format!(
                    "event {id} in {} ends at {} past length_seconds {}",
                    self.url, span.end, self.length_seconds
                )));
            }
        }

        let mut events: Vec<(&EventId, Span)> =
            self.times.iter().map(|(id, span)| (id, *span)).collect();
        events.sort_by(|a, b| a.1.start.total_cmp(&b.1.start));

        for pair in events.windows(2) {
            let (prev_id, prev) = pair[0];
            let (next_id, next) = pair[1];
            if next.start < prev.end {
                return Err(Error::malformed(format!(
                    "events {prev_id} and {next_id} in {} overlap",
                    self.url
                )));
            }
        }

        Ok(events)
    }
}

/// Decode a whole timing array from JSON.
pub fn parse_timing_array(json_str: &str) -> Result<Vec<SegmentDefinition>> {
    serde_json::from_str(json_str)
        .map_err(|e| Error::malformed(format!("timing array parse error: {e}")))
}
