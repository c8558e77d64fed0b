//! segue-timeline: one absolute cue timeline built from sequential media segments.
//!
//! # Modules
//!
//! - [`interval`] - Half-open span math and relative/absolute conversion
//! - [`timing`] - The per-segment ingestion and export format
//! - [`timeline`] - Timeline Builder: segments and absolute event intervals
//! - [`index`] - Event Index: id to timeline position and owning segment
//! - [`locate`] - Time Locator: binary search from absolute time to event/segment

pub mod index;
pub mod interval;
pub mod locate;
pub mod timeline;
pub mod timing;

// Re-export commonly used items at the crate root.
pub use index::{EventIndex, IndexEntry};
pub use interval::{to_absolute, to_relative, Span};
pub use timeline::{EventEntry, EventInterval, Rejection, Segment, Timeline};
pub use timing::{parse_timing_array, SegmentDefinition};
