//! Working state of one boundary scheduler.

use segue_core::{EventId, SegmentIndex};
use std::time::Duration;

/// A scheduled re-check.
///
/// Only the most recently armed wake-up is live; handing an older one back
/// to the scheduler is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wakeup {
    generation: u64,
    delay: Duration,
}

impl Wakeup {
    /// Monotonic tag distinguishing this wake-up from earlier ones.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// How long after arming the wake-up should fire.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// `Idle` or `Watching(event)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Watching(EventId),
}

/// Mutated only by the scheduler that owns it.
#[derive(Debug, Default)]
pub struct ScheduleState {
    active_event: Option<EventId>,
    active_segment: Option<SegmentIndex>,
    last_known_position: Option<f64>,
    pending: Option<Wakeup>,
    generation: u64,
}

impl ScheduleState {
    pub fn watch_state(&self) -> WatchState {
        match &self.active_event {
            Some(id) => WatchState::Watching(id.clone()),
            None => WatchState::Idle,
        }
    }

    pub fn active_event(&self) -> Option<&EventId> {
        self.active_event.as_ref()
    }

    /// Segment whose source the adapter was last seen playing.
    pub fn active_segment(&self) -> Option<SegmentIndex> {
        self.active_segment
    }

    /// Absolute position from the most recent adapter read.
    pub fn last_known_position(&self) -> Option<f64> {
        self.last_known_position
    }

    pub fn pending_wakeup(&self) -> Option<Wakeup> {
        self.pending
    }

    /// Replace any pending wake-up with a fresh one.
    pub(crate) fn arm(&mut self, delay: Duration) -> Wakeup {
        self.generation += 1;
        let wakeup = Wakeup {
            generation: self.generation,
            delay,
        };
        self.pending = Some(wakeup);
        wakeup
    }

    pub(crate) fn cancel(&mut self) -> Option<Wakeup> {
        self.pending.take()
    }

    /// Consume `wakeup` if it is the pending one.
    pub(crate) fn claim(&mut self, wakeup: Wakeup) -> bool {
        if self.pending.map(|p| p.generation) == Some(wakeup.generation) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn set_active_event(&mut self, id: EventId) {
        self.active_event = Some(id);
    }

    pub(crate) fn take_active_event(&mut self) -> Option<EventId> {
        self.active_event.take()
    }

    pub(crate) fn set_active_segment(&mut self, segment: SegmentIndex) {
        self.active_segment = Some(segment);
    }

    pub(crate) fn record_position(&mut self, position: f64) {
        self.last_known_position = Some(position);
    }
}
