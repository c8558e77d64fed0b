//! Shared harness for integration tests.
//!
//! Provides [`ClockElement`], a fake media element whose playhead advances
//! with the tokio clock (run tests with `start_paused = true` for exact
//! timing), and [`CueLog`], a listener whose record outlives the session that
//! owns it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use segue::{CueListener, Error, EventId, PlaybackAdapter, Result, SegmentDefinition, Timeline};
use tokio::time::Instant;

/// Install a test-friendly subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One segment: `x = [0, 4)`, `y = [4, 10)`.
pub fn a_mp3() -> Timeline {
    let mut timeline = Timeline::new();
    timeline
        .add_segment(
            SegmentDefinition::new("a.mp3", 10.0)
                .with_event("x", 0.0, 4.0)
                .with_event("y", 4.0, 10.0),
        )
        .expect("a.mp3 is well formed");
    timeline
}

/// Two 5s segments: `w = [0, 5)` and `z = [6, 7)` (relative `[1, 2)`).
pub fn two_halves() -> Timeline {
    let mut timeline = Timeline::new();
    timeline
        .add_segment(SegmentDefinition::new("one.mp3", 5.0).with_event("w", 0.0, 5.0))
        .expect("one.mp3 is well formed");
    timeline
        .add_segment(SegmentDefinition::new("two.mp3", 5.0).with_event("z", 1.0, 2.0))
        .expect("two.mp3 is well formed");
    timeline
}

#[derive(Debug)]
struct Element {
    lengths: HashMap<String, f64>,
    source: Option<String>,
    offset: f64,
    playing_since: Option<Instant>,
    loads: Vec<String>,
    detached: bool,
}

impl Element {
    fn position(&self) -> f64 {
        let elapsed = self
            .playing_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or_default();
        let length = self
            .source
            .as_ref()
            .and_then(|url| self.lengths.get(url))
            .copied()
            .unwrap_or(f64::INFINITY);
        (self.offset + elapsed).min(length)
    }

    fn check(&self) -> Result<()> {
        if self.detached {
            Err(Error::adapter("element detached"))
        } else {
            Ok(())
        }
    }
}

/// A media element that plays in real (tokio) time and stops at the end of
/// its source. Clones share the same element, so a test can keep one while
/// the session owns another.
#[derive(Debug, Clone)]
pub struct ClockElement {
    inner: Arc<Mutex<Element>>,
}

impl ClockElement {
    /// An element knowing every source of `timeline`, with nothing loaded.
    pub fn new(timeline: &Timeline) -> Self {
        let lengths = timeline
            .segments()
            .iter()
            .map(|segment| (segment.url.clone(), segment.length))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(Element {
                lengths,
                source: None,
                offset: 0.0,
                playing_since: None,
                loads: Vec::new(),
                detached: false,
            })),
        }
    }

    /// An element with `url` already loaded and paused at 0.
    pub fn loaded(timeline: &Timeline, url: &str) -> Self {
        let element = Self::new(timeline);
        element.inner.lock().source = Some(url.to_owned());
        element
    }

    pub fn position(&self) -> f64 {
        self.inner.lock().position()
    }

    pub fn source(&self) -> Option<String> {
        self.inner.lock().source.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.lock().playing_since.is_some()
    }

    /// Every source loaded after construction, in order.
    pub fn loads(&self) -> Vec<String> {
        self.inner.lock().loads.clone()
    }

    /// Move the playhead the way a user dragging the scrubber would; the
    /// caller still has to report the `Seeked` signal.
    pub fn scrub(&self, relative_seconds: f64) {
        let mut element = self.inner.lock();
        element.offset = relative_seconds;
        if element.playing_since.is_some() {
            element.playing_since = Some(Instant::now());
        }
    }

    pub fn detach(&self) {
        self.inner.lock().detached = true;
    }
}

impl PlaybackAdapter for ClockElement {
    fn position_seconds(&self) -> Result<f64> {
        let element = self.inner.lock();
        element.check()?;
        Ok(element.position())
    }

    fn active_source(&self) -> Result<Option<String>> {
        let element = self.inner.lock();
        element.check()?;
        Ok(element.source.clone())
    }

    fn set_active_source(&mut self, url: &str) -> Result<()> {
        let mut element = self.inner.lock();
        element.check()?;
        element.source = Some(url.to_owned());
        element.offset = 0.0;
        element.playing_since = None;
        element.loads.push(url.to_owned());
        Ok(())
    }

    fn seek_to(&mut self, relative_seconds: f64) -> Result<()> {
        self.inner.lock().check()?;
        self.scrub(relative_seconds);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut element = self.inner.lock();
        element.check()?;
        if element.playing_since.is_none() {
            element.playing_since = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut element = self.inner.lock();
        element.check()?;
        element.offset = element.position();
        element.playing_since = None;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Start(String),
    End(String),
    Error(String),
}

pub fn start(id: &str) -> Note {
    Note::Start(id.to_owned())
}

pub fn end(id: &str) -> Note {
    Note::End(id.to_owned())
}

/// Listener recording every notification into a shared log.
#[derive(Debug, Clone, Default)]
pub struct CueLog {
    notes: Arc<Mutex<Vec<Note>>>,
}

impl CueLog {
    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().clone()
    }

    pub fn clear(&self) {
        self.notes.lock().clear();
    }
}

impl CueListener for CueLog {
    fn on_start(&mut self, id: &EventId) {
        self.notes.lock().push(Note::Start(id.to_string()));
    }

    fn on_end(&mut self, id: &EventId) {
        self.notes.lock().push(Note::End(id.to_string()));
    }

    fn on_error(&mut self, error: &Error) {
        self.notes.lock().push(Note::Error(error.to_string()));
    }
}
