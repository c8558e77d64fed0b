//! Cue notifications.
//!
//! The scheduler reports boundary crossings through the [`CueListener`]
//! trait. [`EventBus`] is the stock listener: it wraps a
//! `tokio::sync::broadcast` channel with a bounded ring-buffer of recent
//! notifications so that late subscribers can catch up.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::error::Error;
use crate::ids::EventId;

/// Maximum number of notifications retained in the ring buffer.
const MAX_RECENT_EVENTS: usize = 100;

// ---------------------------------------------------------------------------
// CueListener
// ---------------------------------------------------------------------------

/// Receiver of start/end notifications from a boundary scheduler.
///
/// Calls arrive on the scheduler's own task, in order, never concurrently.
pub trait CueListener {
    /// Playback entered the interval `id`.
    fn on_start(&mut self, id: &EventId);

    /// Playback left the interval `id`.
    fn on_end(&mut self, id: &EventId);

    /// A wake-up failed and the scheduler stopped watching.
    fn on_error(&mut self, _error: &Error) {}
}

impl<L: CueListener + ?Sized> CueListener for Box<L> {
    fn on_start(&mut self, id: &EventId) {
        (**self).on_start(id);
    }

    fn on_end(&mut self, id: &EventId) {
        (**self).on_end(id);
    }

    fn on_error(&mut self, error: &Error) {
        (**self).on_error(error);
    }
}

// ---------------------------------------------------------------------------
// CuePayload / CueEvent
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CuePayload {
    Start { event_id: EventId },
    End { event_id: EventId },
    Error { message: String },
}

/// A timestamped notification ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CueEvent {
    /// Unique notification identifier.
    pub id: Uuid,
    /// When the notification was emitted.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub payload: CuePayload,
}

impl CueEvent {
    /// Create a new notification with a fresh UUID and the current timestamp.
    pub fn new(payload: CuePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast channel with a bounded ring buffer of recent notifications.
pub struct EventBus {
    tx: broadcast::Sender<CueEvent>,
    recent: RwLock<VecDeque<CueEvent>>,
}

impl EventBus {
    /// Create a new event bus.
    ///
    /// `capacity` controls the broadcast channel buffer size (not the ring
    /// buffer, which is always [`MAX_RECENT_EVENTS`]).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            recent: RwLock::new(VecDeque::with_capacity(MAX_RECENT_EVENTS)),
        }
    }

    /// Create a bus sized by `config.event_bus_capacity`.
    pub fn with_config(config: &SchedulerConfig) -> Self {
        Self::new(config.event_bus_capacity)
    }

    /// Subscribe to the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<CueEvent> {
        self.tx.subscribe()
    }

    /// Broadcast a notification to all current subscribers and store it in
    /// the ring buffer.
    pub fn broadcast(&self, payload: CuePayload) {
        let event = CueEvent::new(payload);

        {
            let mut recent = self.recent.write();
            if recent.len() >= MAX_RECENT_EVENTS {
                recent.pop_back();
            }
            recent.push_front(event.clone());
        }

        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    /// Return the `n` most recent notifications (newest first).
    pub fn recent_events(&self, n: usize) -> Vec<CueEvent> {
        let recent = self.recent.read();
        recent.iter().take(n).cloned().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl CueListener for EventBus {
    fn on_start(&mut self, id: &EventId) {
        self.broadcast(CuePayload::Start { event_id: id.clone() });
    }

    fn on_end(&mut self, id: &EventId) {
        self.broadcast(CuePayload::End { event_id: id.clone() });
    }

    fn on_error(&mut self, error: &Error) {
        self.broadcast(CuePayload::Error {
            message: error.to_string(),
        });
    }
}

/// A shared bus lets the host keep subscribing while a scheduler owns it.
impl CueListener for Arc<EventBus> {
    fn on_start(&mut self, id: &EventId) {
        self.broadcast(CuePayload::Start { event_id: id.clone() });
    }

    fn on_end(&mut self, id: &EventId) {
        self.broadcast(CuePayload::End { event_id: id.clone() });
    }

    fn on_error(&mut self, error: &Error) {
        self.broadcast(CuePayload::Error {
            message: error.to_string(),
        });
    }
}
