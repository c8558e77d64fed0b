//! Playback Controller: "play event X" and "play at time T" expressed as
//! segment-relative adapter commands.

use segue_core::{CueListener, Error, EventId, Result, SchedulerConfig};
use segue_timeline::{to_relative, Timeline};
use std::sync::Arc;

use crate::adapter::{PlaybackAdapter, Signal};
use crate::scheduler::{BoundaryScheduler, Wakeup};

/// Front door for a host: owns the scheduler bound to one adapter.
pub struct PlaybackController<A, L> {
    scheduler: BoundaryScheduler<A, L>,
}

impl<A: PlaybackAdapter, L: CueListener> PlaybackController<A, L> {
    pub fn new(timeline: Arc<Timeline>, adapter: A, listener: L, config: SchedulerConfig) -> Self {
        Self::from_scheduler(BoundaryScheduler::new(timeline, adapter, listener, config))
    }

    pub fn from_scheduler(scheduler: BoundaryScheduler<A, L>) -> Self {
        Self { scheduler }
    }

    /// Jump to the start of event `id` and play from there.
    ///
    /// The event becomes current immediately, so [`current_event`] reflects
    /// it before the adapter reports anything back.
    ///
    /// [`current_event`]: Self::current_event
    pub fn play_from_event_id(&mut self, id: &str) -> Result<Option<Wakeup>> {
        let timeline = Arc::clone(self.scheduler.timeline());
        let entry = timeline
            .lookup(id)
            .ok_or_else(|| Error::UnknownEventId(EventId::new(id)))?;
        let segment = entry.segment;
        let interval = entry.interval;
        let relative = to_relative(interval.start(), segment.start);

        tracing::info!(
            event_id = %interval.id,
            url = %segment.url,
            relative,
            "Playing from event"
        );

        if let Err(e) = self.cue_adapter(&segment.url, relative) {
            return Err(self.scheduler.fail(e));
        }

        Ok(self
            .scheduler
            .activate(&interval.id, segment.index, interval.start()))
    }

    /// Play from the start of the event containing absolute time `time`.
    pub fn play_from_time(&mut self, time: f64) -> Result<Option<Wakeup>> {
        let id = self
            .scheduler
            .timeline()
            .locate(time)
            .map(|interval| interval.id.clone())
            .ok_or(Error::TimeOutOfRange(time))?;
        self.play_from_event_id(id.as_str())
    }

    /// Forward a media element signal to the scheduler.
    ///
    /// With `auto_advance` on, [`Signal::Ended`] also loads the following
    /// segment and keeps playing from its start.
    pub fn handle_signal(&mut self, signal: Signal) -> Result<Option<Wakeup>> {
        let wakeup = self.scheduler.handle_signal(signal)?;
        if signal == Signal::Ended && self.scheduler.config().auto_advance {
            return self.advance();
        }
        Ok(wakeup)
    }

    pub fn handle_wakeup(&mut self, wakeup: Wakeup) -> Result<Option<Wakeup>> {
        self.scheduler.handle_wakeup(wakeup)
    }

    /// Tell the listener about a failure the host could not return anywhere.
    pub fn report_error(&mut self, error: &Error) {
        self.scheduler.listener_mut().on_error(error);
    }

    pub fn current_event(&self) -> Option<&EventId> {
        self.scheduler.current_event()
    }

    /// Absolute playhead.
    pub fn current_time(&mut self) -> Result<f64> {
        self.scheduler.current_time()
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        self.scheduler.timeline()
    }

    pub fn scheduler(&self) -> &BoundaryScheduler<A, L> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut BoundaryScheduler<A, L> {
        &mut self.scheduler
    }

    fn cue_adapter(&mut self, url: &str, relative: f64) -> Result<()> {
        let adapter = self.scheduler.adapter_mut();
        if adapter.active_source()?.as_deref() != Some(url) {
            tracing::debug!(url, "Loading source");
            adapter.set_active_source(url)?;
        }
        adapter.seek_to(relative)?;
        adapter.play()
    }

    /// Continue into the segment after the one that just ended.
    fn advance(&mut self) -> Result<Option<Wakeup>> {
        let current = match self.scheduler.resolve_segment() {
            Ok(index) => index,
            Err(e) => return Err(self.scheduler.fail(e)),
        };
        let timeline = Arc::clone(self.scheduler.timeline());
        let Some(next) = timeline.segment(current.next()) else {
            tracing::info!("Reached end of timeline");
            return Ok(None);
        };

        tracing::info!(url = %next.url, index = %next.index, "Advancing to next segment");
        if let Err(e) = self.cue_adapter(&next.url, 0.0) {
            return Err(self.scheduler.fail(e));
        }
        self.scheduler.handle_signal(Signal::Play)
    }
}
