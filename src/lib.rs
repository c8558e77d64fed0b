//! Segue - stitch sequential media segments into one timeline and fire cue
//! start/end notifications while a host's media element plays them.
//!
//! The timeline itself lives in `segue-timeline`; this crate binds it to a
//! playhead:
//!
//! - [`adapter`] - The host media element interface and its signals
//! - [`scheduler`] - Boundary Scheduler: start/end detection with one pending wake-up
//! - [`controller`] - Playback Controller: play by event id or absolute time
//! - [`session`] - Tokio task that owns a controller and drives its wake-ups

pub mod adapter;
pub mod controller;
pub mod scheduler;
pub mod session;

#[cfg(test)]
mod test_fixtures;

pub use adapter::{PlaybackAdapter, Signal};
pub use controller::PlaybackController;
pub use scheduler::{BoundaryScheduler, ScheduleState, Wakeup, WatchState};
pub use session::{spawn_session, Session, SessionHandle};

pub use segue_core::{
    CueEvent, CueListener, CuePayload, Error, EventBus, EventId, Result, SchedulerConfig,
    SegmentIndex,
};
pub use segue_timeline::{EventInterval, Segment, SegmentDefinition, Span, Timeline};
