//! segue-core: shared errors, identifiers, configuration, and cue notifications.
//!
//! This crate is the foundational dependency for the other segue crates,
//! providing typed identifiers, a unified error type, the scheduler
//! configuration, and a broadcast bus for cue start/end notifications.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;

// Re-export the most commonly used items at the crate root.
pub use config::SchedulerConfig;
pub use error::{Error, Result};
pub use events::{CueEvent, CueListener, CuePayload, EventBus};
pub use ids::{EventId, SegmentIndex};
