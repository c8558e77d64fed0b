use segue_core::{CueListener, Error, EventId, Result};
use segue_timeline::{SegmentDefinition, Timeline};

use crate::adapter::PlaybackAdapter;

/// One segment: `x = [0, 4)`, `y = [4, 10)`.
pub fn a_mp3() -> Timeline {
    let mut timeline = Timeline::new();
    timeline
        .add_segment(
            SegmentDefinition::new("a.mp3", 10.0)
                .with_event("x", 0.0, 4.0)
                .with_event("y", 4.0, 10.0),
        )
        .unwrap();
    timeline
}

/// Two 5s segments: `w = [0, 5)` and `z = [6, 7)` (relative `[1, 2)`).
pub fn two_halves() -> Timeline {
    let mut timeline = Timeline::new();
    timeline
        .add_segment(SegmentDefinition::new("one.mp3", 5.0).with_event("w", 0.0, 5.0))
        .unwrap();
    timeline
        .add_segment(SegmentDefinition::new("two.mp3", 5.0).with_event("z", 1.0, 2.0))
        .unwrap();
    timeline
}

/// Adapter whose playhead only moves when a test sets it.
#[derive(Debug, Default)]
pub struct ManualAdapter {
    pub source: Option<String>,
    pub position: f64,
    pub playing: bool,
    pub broken: bool,
    pub source_loads: usize,
}

impl ManualAdapter {
    pub fn loaded(url: &str) -> Self {
        Self {
            source: Some(url.to_owned()),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.broken {
            Err(Error::adapter("element detached"))
        } else {
            Ok(())
        }
    }
}

impl PlaybackAdapter for ManualAdapter {
    fn position_seconds(&self) -> Result<f64> {
        self.check()?;
        Ok(self.position)
    }

    fn active_source(&self) -> Result<Option<String>> {
        self.check()?;
        Ok(self.source.clone())
    }

    fn set_active_source(&mut self, url: &str) -> Result<()> {
        self.check()?;
        self.source = Some(url.to_owned());
        self.position = 0.0;
        self.source_loads += 1;
        Ok(())
    }

    fn seek_to(&mut self, relative_seconds: f64) -> Result<()> {
        self.check()?;
        self.position = relative_seconds;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.check()?;
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.check()?;
        self.playing = false;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Start(String),
    End(String),
    Error(String),
}

/// Listener that keeps every notification in order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub notes: Vec<Note>,
}

impl CueListener for RecordingListener {
    fn on_start(&mut self, id: &EventId) {
        self.notes.push(Note::Start(id.to_string()));
    }

    fn on_end(&mut self, id: &EventId) {
        self.notes.push(Note::End(id.to_string()));
    }

    fn on_error(&mut self, error: &Error) {
        self.notes.push(Note::Error(error.to_string()));
    }
}
