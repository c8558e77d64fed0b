//! Unified error type for segue.
//!
//! Ingestion, lookup, playback and adapter failures all funnel into
//! [`Error`]. Ingestion errors reject a single segment; the rest are surfaced
//! synchronously to whoever issued the call.

use crate::ids::EventId;

/// Unified error type covering all failure modes in segue.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A segment definition has a bad shape or bad values.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An event id is already present in the timeline.
    #[error("Duplicate event id: {0}")]
    DuplicateEventId(EventId),

    /// No event with this id exists in the timeline.
    #[error("Unknown event id: {0}")]
    UnknownEventId(EventId),

    /// No event interval contains the requested absolute time.
    #[error("Time out of range: {0}s")]
    TimeOutOfRange(f64),

    /// The playback adapter is unset or one of its calls failed.
    #[error("Playback adapter unavailable: {0}")]
    AdapterUnavailable(String),

    /// The session driver has shut down and no longer accepts commands.
    #[error("Session closed")]
    SessionClosed,

    /// Configuration could not be parsed.
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Convenience constructor for [`Error::MalformedInput`].
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInput(message.into())
    }

    /// Convenience constructor for [`Error::AdapterUnavailable`].
    pub fn adapter(message: impl Into<String>) -> Self {
        Error::AdapterUnavailable(message.into())
    }

    /// Whether this error came from segment ingestion (and therefore only
    /// rejected the offending segment).
    pub fn is_ingestion(&self) -> bool {
        matches!(self, Error::MalformedInput(_) | Error::DuplicateEventId(_))
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
