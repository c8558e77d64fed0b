//! Tokio driver for a [`PlaybackController`].
//!
//! A [`Session`] owns the controller on a single task and serializes every
//! signal, host command and wake-up through one `select!` loop. The scheduler
//! never sees two inputs at once, and the single timer slot mirrors the
//! scheduler's single pending wake-up.
//!
//! The task runs until [`SessionHandle::shutdown`] is called or every handle
//! is dropped, then yields the controller back through its `JoinHandle`.

use segue_core::{CueListener, Error, EventId, Result};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::adapter::{PlaybackAdapter, Signal};
use crate::controller::PlaybackController;
use crate::scheduler::Wakeup;

/// Fallback deadline for delays too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

enum Command {
    Signal(Signal),
    PlayEvent {
        id: String,
        reply: oneshot::Sender<Result<()>>,
    },
    PlayTime {
        time: f64,
        reply: oneshot::Sender<Result<()>>,
    },
    CurrentEvent {
        reply: oneshot::Sender<Option<EventId>>,
    },
    CurrentTime {
        reply: oneshot::Sender<Result<f64>>,
    },
    Shutdown,
}

/// Cloneable front end to a running [`Session`].
///
/// Every method fails with [`Error::SessionClosed`] once the session task
/// has exited.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Forward a media element signal. Failures while handling it are
    /// delivered to the listener's `on_error`.
    pub async fn signal(&self, signal: Signal) -> Result<()> {
        self.send(Command::Signal(signal)).await
    }

    pub async fn play_from_event_id(&self, id: impl Into<String>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::PlayEvent {
            id: id.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| Error::SessionClosed)?
    }

    pub async fn play_from_time(&self, time: f64) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::PlayTime { time, reply }).await?;
        rx.await.map_err(|_| Error::SessionClosed)?
    }

    pub async fn current_event(&self) -> Result<Option<EventId>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CurrentEvent { reply }).await?;
        rx.await.map_err(|_| Error::SessionClosed)
    }

    pub async fn current_time(&self) -> Result<f64> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::CurrentTime { reply }).await?;
        rx.await.map_err(|_| Error::SessionClosed)?
    }

    /// Ask the session to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::SessionClosed)
    }
}

/// A controller plus the timer and command queue that drive it.
pub struct Session<A, L> {
    controller: PlaybackController<A, L>,
    rx: mpsc::Receiver<Command>,
}

impl<A: PlaybackAdapter, L: CueListener> Session<A, L> {
    /// Wrap `controller`; the command queue holds `command_buffer` entries
    /// from its config.
    pub fn new(controller: PlaybackController<A, L>) -> (Self, SessionHandle) {
        let buffer = controller.scheduler().config().command_buffer.max(1);
        let (tx, rx) = mpsc::channel(buffer);
        (Self { controller, rx }, SessionHandle { tx })
    }

    /// Process commands and wake-ups until shut down.
    pub async fn run(mut self) -> PlaybackController<A, L> {
        tracing::info!("Playback session started");
        let mut armed: Option<(Wakeup, Instant)> = None;

        loop {
            let deadline = armed.map(|(_, at)| at);

            tokio::select! {
                biased;

                command = self.rx.recv() => match command {
                    Some(Command::Shutdown) | None => {
                        tracing::info!("Playback session shutting down");
                        break;
                    }
                    Some(command) => self.execute(command),
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((wakeup, _)) = armed.take() {
                        if let Err(e) = self.controller.handle_wakeup(wakeup) {
                            self.controller.report_error(&e);
                        }
                    }
                }
            }

            armed = rearm(armed, self.controller.scheduler().state().pending_wakeup());
        }

        self.controller
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Signal(signal) => {
                if let Err(e) = self.controller.handle_signal(signal) {
                    tracing::warn!(?signal, "Signal handling failed: {e}");
                    self.controller.report_error(&e);
                }
            }
            Command::PlayEvent { id, reply } => {
                let result = self.controller.play_from_event_id(&id).map(|_| ());
                let _ = reply.send(result);
            }
            Command::PlayTime { time, reply } => {
                let result = self.controller.play_from_time(time).map(|_| ());
                let _ = reply.send(result);
            }
            Command::CurrentEvent { reply } => {
                let _ = reply.send(self.controller.current_event().cloned());
            }
            Command::CurrentTime { reply } => {
                let _ = reply.send(self.controller.current_time());
            }
            Command::Shutdown => {}
        }
    }
}

/// Keep the running deadline while the same wake-up is pending; start a new
/// one when the scheduler armed a different wake-up.
fn rearm(armed: Option<(Wakeup, Instant)>, pending: Option<Wakeup>) -> Option<(Wakeup, Instant)> {
    let pending = pending?;
    match armed {
        Some((current, at)) if current == pending => Some((current, at)),
        _ => {
            let now = Instant::now();
            let at = now
                .checked_add(pending.delay())
                .unwrap_or_else(|| now + FAR_FUTURE);
            Some((pending, at))
        }
    }
}

/// Run `controller` on its own task.
///
/// The returned `JoinHandle` resolves to the controller once the session
/// stops.
pub fn spawn_session<A, L>(
    controller: PlaybackController<A, L>,
) -> (SessionHandle, JoinHandle<PlaybackController<A, L>>)
where
    A: PlaybackAdapter + Send + 'static,
    L: CueListener + Send + 'static,
{
    let (session, handle) = Session::new(controller);
    (handle, tokio::spawn(session.run()))
}
