//! The narrow interface to the host's media element.
//!
//! Segue never drives a concrete player. The host implements
//! [`PlaybackAdapter`] over whatever element it owns and forwards that
//! element's state changes as [`Signal`]s.

use segue_core::Result;
use serde::{Deserialize, Serialize};

/// Commands and queries segue issues against the host's media element.
///
/// Every call is fallible: an unset or detached element should answer
/// with [`Error::AdapterUnavailable`](segue_core::Error::AdapterUnavailable).
pub trait PlaybackAdapter {
    /// Current playback offset relative to the start of the active source.
    fn position_seconds(&self) -> Result<f64>;

    /// Url of the loaded source, if any.
    fn active_source(&self) -> Result<Option<String>>;

    /// Load a different source.
    fn set_active_source(&mut self, url: &str) -> Result<()>;

    /// Move the playhead within the active source.
    fn seek_to(&mut self, relative_seconds: f64) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;
}

impl<A: PlaybackAdapter + ?Sized> PlaybackAdapter for Box<A> {
    fn position_seconds(&self) -> Result<f64> {
        (**self).position_seconds()
    }

    fn active_source(&self) -> Result<Option<String>> {
        (**self).active_source()
    }

    fn set_active_source(&mut self, url: &str) -> Result<()> {
        (**self).set_active_source(url)
    }

    fn seek_to(&mut self, relative_seconds: f64) -> Result<()> {
        (**self).seek_to(relative_seconds)
    }

    fn play(&mut self) -> Result<()> {
        (**self).play()
    }

    fn pause(&mut self) -> Result<()> {
        (**self).pause()
    }
}

/// A state change reported by the host's media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Play,
    Playing,
    Seeked,
    Pause,
    Suspend,
    Abort,
    /// The active source played to its end.
    Ended,
}

impl Signal {
    /// Signals after which the playhead is (again) moving.
    pub fn is_resume(self) -> bool {
        matches!(self, Signal::Play | Signal::Playing | Signal::Seeked)
    }

    /// Signals after which the playhead has stopped.
    pub fn is_stop(self) -> bool {
        !self.is_resume()
    }
}
