//! Boundary Scheduler: keeps start/end notifications in step with a
//! playhead it does not control.
//!
//! The scheduler is a synchronous state machine (`Idle` or
//! `Watching(event)`). Every transition returns the next [`Wakeup`] it wants,
//! sized to the time left in the active event plus a small slack, and the
//! caller is expected to hand that wake-up back after its delay. At most one
//! wake-up is live at a time: every signal cancels the pending one before
//! anything else happens, and a cancelled or superseded wake-up handed back
//! later is ignored.
//!
//! [`crate::session`] drives this loop on tokio; hosts with their own timer
//! facility can drive it directly.

mod state;

pub use state::{ScheduleState, Wakeup, WatchState};

use segue_core::{CueListener, Error, EventId, Result, SchedulerConfig, SegmentIndex};
use segue_timeline::{to_absolute, EventInterval, Span, Timeline};
use std::sync::Arc;
use std::time::Duration;

use crate::adapter::{PlaybackAdapter, Signal};

/// Watches one adapter and reports boundary crossings to one listener.
pub struct BoundaryScheduler<A, L> {
    timeline: Arc<Timeline>,
    adapter: A,
    listener: L,
    config: SchedulerConfig,
    state: ScheduleState,
}

impl<A: PlaybackAdapter, L: CueListener> BoundaryScheduler<A, L> {
    pub fn new(timeline: Arc<Timeline>, adapter: A, listener: L, config: SchedulerConfig) -> Self {
        Self {
            timeline,
            adapter,
            listener,
            config,
            state: ScheduleState::default(),
        }
    }

    /// React to a state change of the media element.
    ///
    /// Resume signals re-read the playhead and (re)enter watching; a seek
    /// that leaves the active event closes it first. Stop signals close the
    /// active event and leave nothing scheduled.
    pub fn handle_signal(&mut self, signal: Signal) -> Result<Option<Wakeup>> {
        if let Some(cancelled) = self.state.cancel() {
            tracing::trace!(generation = cancelled.generation(), "Cancelled pending wake-up");
        }

        if signal.is_resume() {
            tracing::debug!(?signal, "Playback resumed");
            self.reevaluate()
        } else {
            tracing::debug!(?signal, "Playback stopped");
            self.close_active();
            Ok(None)
        }
    }

    /// Run a wake-up previously returned by this scheduler.
    ///
    /// Stale wake-ups (cancelled or superseded) do nothing and return `None`.
    pub fn handle_wakeup(&mut self, wakeup: Wakeup) -> Result<Option<Wakeup>> {
        if !self.state.claim(wakeup) {
            tracing::trace!(generation = wakeup.generation(), "Ignoring stale wake-up");
            return Ok(None);
        }
        self.reevaluate()
    }

    /// Absolute playhead: start of the adapter's source plus its offset.
    pub fn current_time(&mut self) -> Result<f64> {
        let relative = self.adapter.position_seconds()?;
        if !relative.is_finite() {
            return Err(Error::adapter(format!(
                "adapter reported non-finite position {relative}"
            )));
        }
        let segment = self.resolve_segment()?;
        let start = self
            .timeline
            .segment(segment)
            .map(|s| s.start)
            .unwrap_or_default();
        let position = to_absolute(relative, start);
        self.state.record_position(position);
        Ok(position)
    }

    /// Segment matching the adapter's loaded source.
    pub fn resolve_segment(&mut self) -> Result<SegmentIndex> {
        let url = self
            .adapter
            .active_source()?
            .ok_or_else(|| Error::adapter("no source loaded"))?;
        let index = self
            .timeline
            .segment_by_url(&url)
            .map(|segment| segment.index)
            .ok_or_else(|| Error::adapter(format!("active source {url} is not on the timeline")))?;
        self.state.set_active_segment(index);
        Ok(index)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &ScheduleState {
        &self.state
    }

    /// The event currently being watched.
    pub fn current_event(&self) -> Option<&EventId> {
        self.state.active_event()
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    // -----------------------------------------------------------------------
    // Crate-internal entry points for the controller
    // -----------------------------------------------------------------------

    /// Make `id` the active event right away, without waiting for the
    /// adapter to report the seek.
    pub(crate) fn activate(
        &mut self,
        id: &EventId,
        segment: SegmentIndex,
        position: f64,
    ) -> Option<Wakeup> {
        self.state.cancel();
        self.state.set_active_segment(segment);
        self.state.record_position(position);

        if self.state.active_event() != Some(id) {
            self.close_active();
            self.open(id.clone());
        }

        let timeline = Arc::clone(&self.timeline);
        let span = timeline.lookup(id.as_str())?.interval.span;
        Some(self.arm_watch(span, position))
    }

    /// Abandon watching after an adapter failure and hand the error back.
    pub(crate) fn fail(&mut self, error: Error) -> Error {
        self.state.cancel();
        self.close_active();
        tracing::warn!("Boundary scheduler stopped: {error}");
        error
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn reevaluate(&mut self) -> Result<Option<Wakeup>> {
        match self.current_time() {
            Ok(position) => Ok(self.settle(position)),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Bring the state in line with `position` and arm the next wake-up.
    ///
    /// Only events of the segment being played can be entered: a source
    /// parked at its end reports the absolute start of the next segment.
    fn settle(&mut self, position: f64) -> Option<Wakeup> {
        let timeline = Arc::clone(&self.timeline);
        let segment = self.state.active_segment();
        let playable = |interval: &EventInterval| {
            Some(interval.segment) == segment && interval.span.contains(position)
        };

        if let Some(active) = self.state.active_event().cloned() {
            match timeline.lookup(active.as_str()) {
                Some(entry) if playable(entry.interval) => {
                    tracing::trace!(event_id = %active, position, "Still inside active event");
                    return Some(self.arm_watch(entry.interval.span, position));
                }
                _ => self.close_active(),
            }
        }

        match timeline.locate(position).filter(|interval| playable(*interval)) {
            Some(interval) => {
                self.open(interval.id.clone());
                Some(self.arm_watch(interval.span, position))
            }
            None => self.arm_gap(&timeline, position),
        }
    }

    fn open(&mut self, id: EventId) {
        tracing::debug!(event_id = %id, "Event started");
        self.listener.on_start(&id);
        self.state.set_active_event(id);
    }

    fn close_active(&mut self) {
        if let Some(id) = self.state.take_active_event() {
            tracing::debug!(event_id = %id, "Event ended");
            self.listener.on_end(&id);
        }
    }

    /// Wake just after the active event should have ended.
    fn arm_watch(&mut self, span: Span, position: f64) -> Wakeup {
        let delay = seconds(span.remaining_from(position)).saturating_add(self.config.epsilon());
        let wakeup = self.state.arm(delay);
        tracing::debug!(
            generation = wakeup.generation(),
            delay_ms = delay.as_millis() as u64,
            "Armed boundary wake-up"
        );
        wakeup
    }

    /// Poll a gap between events; nothing is armed when no event lies ahead
    /// in the active segment. Later segments are reached through a source
    /// change, which always arrives as a signal.
    fn arm_gap(&mut self, timeline: &Timeline, position: f64) -> Option<Wakeup> {
        let next = timeline
            .next_event_after(position)
            .filter(|next| Some(next.segment) == self.state.active_segment());
        let Some(next) = next else {
            tracing::debug!(position, "No event ahead in this segment; idle");
            return None;
        };
        let until_next = seconds(next.start() - position).saturating_add(self.config.epsilon());
        let delay = until_next.min(self.config.gap_recheck());
        let wakeup = self.state.arm(delay);
        tracing::debug!(
            generation = wakeup.generation(),
            delay_ms = delay.as_millis() as u64,
            next_event = %next.id,
            "Armed gap re-check"
        );
        Some(wakeup)
    }
}

/// Non-negative seconds to a `Duration`, saturating on overflow.
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{a_mp3, ManualAdapter, Note, RecordingListener};

    fn scheduler() -> BoundaryScheduler<ManualAdapter, RecordingListener> {
        BoundaryScheduler::new(
            Arc::new(a_mp3()),
            ManualAdapter::loaded("a.mp3"),
            RecordingListener::default(),
            SchedulerConfig::default(),
        )
    }

    #[test]
    fn play_starts_watching_and_arms_until_end() {
        let mut sched = scheduler();
        sched.adapter_mut().position = 1.0;

        let wakeup = sched.handle_signal(Signal::Play).unwrap().unwrap();

        assert_eq!(sched.listener().notes, [Note::Start("x".into())]);
        assert_eq!(sched.state().watch_state(), WatchState::Watching(EventId::new("x")));
        assert_eq!(wakeup.delay(), Duration::from_millis(3005));
        assert_eq!(sched.state().last_known_position(), Some(1.0));
    }

    #[test]
    fn early_wakeup_rearms_without_notifying() {
        let mut sched = scheduler();
        let wakeup = sched.handle_signal(Signal::Play).unwrap().unwrap();

        // Buffering stall: the playhead only reached 3.0 of [0, 4).
        sched.adapter_mut().position = 3.0;
        let next = sched.handle_wakeup(wakeup).unwrap().unwrap();

        assert_eq!(sched.listener().notes, [Note::Start("x".into())]);
        assert_eq!(next.delay(), Duration::from_millis(1005));
    }

    #[test]
    fn crossing_ends_old_and_starts_new() {
        let mut sched = scheduler();
        let wakeup = sched.handle_signal(Signal::Play).unwrap().unwrap();

        sched.adapter_mut().position = 4.005;
        sched.handle_wakeup(wakeup).unwrap();

        assert_eq!(
            sched.listener().notes,
            [
                Note::Start("x".into()),
                Note::End("x".into()),
                Note::Start("y".into())
            ]
        );
        assert_eq!(sched.current_event(), Some(&EventId::new("y")));
    }

    #[test]
    fn leaving_the_last_event_goes_idle() {
        let mut sched = scheduler();
        sched.adapter_mut().position = 9.0;
        let wakeup = sched.handle_signal(Signal::Playing).unwrap().unwrap();

        sched.adapter_mut().position = 10.0;
        let next = sched.handle_wakeup(wakeup).unwrap();

        assert!(next.is_none());
        assert_eq!(sched.state().watch_state(), WatchState::Idle);
        assert_eq!(sched.listener().notes.last(), Some(&Note::End("y".into())));
    }

    #[test]
    fn stale_wakeup_is_ignored() {
        let mut sched = scheduler();
        let first = sched.handle_signal(Signal::Play).unwrap().unwrap();
        let second = sched.handle_signal(Signal::Playing).unwrap().unwrap();
        assert_ne!(first, second);

        sched.adapter_mut().position = 8.0;
        assert_eq!(sched.handle_wakeup(first).unwrap(), None);
        assert_eq!(sched.listener().notes, [Note::Start("x".into())]);
        assert_eq!(sched.state().pending_wakeup(), Some(second));
    }

    #[test]
    fn repeated_resume_inside_event_does_not_duplicate() {
        let mut sched = scheduler();
        sched.handle_signal(Signal::Play).unwrap();
        sched.handle_signal(Signal::Playing).unwrap();
        sched.adapter_mut().position = 2.0;
        sched.handle_signal(Signal::Seeked).unwrap();

        assert_eq!(sched.listener().notes, [Note::Start("x".into())]);
    }

    #[test]
    fn stop_ends_active_event_once() {
        let mut sched = scheduler();
        sched.handle_signal(Signal::Play).unwrap();

        assert_eq!(sched.handle_signal(Signal::Pause).unwrap(), None);
        assert_eq!(sched.handle_signal(Signal::Suspend).unwrap(), None);

        assert_eq!(
            sched.listener().notes,
            [Note::Start("x".into()), Note::End("x".into())]
        );
        assert!(sched.state().pending_wakeup().is_none());
    }

    #[test]
    fn gap_rechecks_with_fixed_delay() {
        let mut timeline = Timeline::new();
        timeline
            .add_segment(
                segue_timeline::SegmentDefinition::new("g.mp3", 10.0).with_event("late", 5.0, 6.0),
            )
            .unwrap();
        let mut sched = BoundaryScheduler::new(
            Arc::new(timeline),
            ManualAdapter::loaded("g.mp3"),
            RecordingListener::default(),
            SchedulerConfig::default(),
        );

        let wakeup = sched.handle_signal(Signal::Play).unwrap().unwrap();
        assert!(sched.listener().notes.is_empty());
        assert_eq!(wakeup.delay(), Duration::from_millis(100));

        // Close to the next event the re-check shrinks to reach it.
        sched.adapter_mut().position = 4.97;
        let wakeup = sched.handle_wakeup(wakeup).unwrap().unwrap();
        assert_eq!(wakeup.delay().as_millis(), 35);

        sched.adapter_mut().position = 6.5;
        assert_eq!(sched.handle_wakeup(wakeup).unwrap(), None);
    }

    #[test]
    fn source_parked_at_its_end_stays_out_of_next_segment() {
        let mut timeline = Timeline::new();
        timeline
            .add_segment(
                segue_timeline::SegmentDefinition::new("one.mp3", 5.0).with_event("a", 0.0, 5.0),
            )
            .unwrap();
        timeline
            .add_segment(
                segue_timeline::SegmentDefinition::new("two.mp3", 5.0).with_event("b", 0.0, 1.0),
            )
            .unwrap();
        let mut sched = BoundaryScheduler::new(
            Arc::new(timeline),
            ManualAdapter::loaded("one.mp3"),
            RecordingListener::default(),
            SchedulerConfig::default(),
        );

        sched.adapter_mut().position = 4.0;
        let wakeup = sched.handle_signal(Signal::Play).unwrap().unwrap();
        sched.adapter_mut().position = 5.0;

        assert_eq!(sched.handle_wakeup(wakeup).unwrap(), None);
        assert_eq!(
            sched.listener().notes,
            [Note::Start("a".into()), Note::End("a".into())]
        );

        sched.adapter_mut().source = Some("two.mp3".into());
        sched.adapter_mut().position = 0.0;
        sched.handle_signal(Signal::Playing).unwrap();
        assert_eq!(sched.current_event(), Some(&EventId::new("b")));
    }

    #[test]
    fn adapter_failure_cancels_and_surfaces() {
        let mut sched = scheduler();
        let wakeup = sched.handle_signal(Signal::Play).unwrap().unwrap();

        sched.adapter_mut().broken = true;
        let err = sched.handle_wakeup(wakeup).unwrap_err();

        assert!(matches!(err, Error::AdapterUnavailable(_)));
        assert!(sched.state().pending_wakeup().is_none());
        assert_eq!(sched.state().watch_state(), WatchState::Idle);
        assert_eq!(
            sched.listener().notes,
            [Note::Start("x".into()), Note::End("x".into())]
        );
    }

    #[test]
    fn unknown_source_is_adapter_error() {
        let mut sched = scheduler();
        sched.adapter_mut().source = Some("elsewhere.mp3".into());
        assert!(matches!(
            sched.handle_signal(Signal::Play),
            Err(Error::AdapterUnavailable(_))
        ));

        sched.adapter_mut().source = None;
        assert!(matches!(sched.current_time(), Err(Error::AdapterUnavailable(_))));
    }

    #[test]
    fn non_finite_position_is_adapter_error() {
        let mut sched = scheduler();
        sched.adapter_mut().position = f64::NAN;
        assert!(matches!(
            sched.handle_signal(Signal::Play),
            Err(Error::AdapterUnavailable(_))
        ));
    }

    #[test]
    fn seconds_saturates() {
        assert_eq!(seconds(-1.0), Duration::ZERO);
        assert_eq!(seconds(f64::INFINITY), Duration::MAX);
        assert_eq!(seconds(0.25), Duration::from_millis(250));
    }
}
