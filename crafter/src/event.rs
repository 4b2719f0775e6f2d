//! Event bus for crafter.
//!
//! Terminal input, timer ticks and finished background requests are all funnelled
//! into one `AppEvent` channel. The main loop is the only consumer and the only
//! place that mutates `AppState`, so a submission's results land in the editors
//! in one step, never half-applied.
//!
//! Two independent intervals drive the loop:
//! - **Render** (33 ms, about 30 FPS) triggers a `terminal.draw()`.
//! - **Tick** (250 ms) expires toasts and animates the busy indicator.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

use crafter_core::submit::Progress;

use crate::worker::{RunReport, SubmissionReport};

/// All events the application can receive from any source.
#[derive(Debug)]
#[non_exhaustive]
pub enum AppEvent {
    /// A key press (`KeyEventKind::Press` only; release/repeat are filtered).
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    Tick,
    Render,
    /// The background submission started an attempt or began a retry wait.
    SubmissionProgress(Progress),
    /// A submission reached its terminal outcome on the background task.
    Submission(Box<SubmissionReport>),
    /// The run endpoint answered.
    RunFinished(RunReport),
    Quit,
}

/// Sender and receiver ends of the unified event channel.
pub struct EventHandler {
    /// Cloned into every background task that produces events.
    pub tx: mpsc::UnboundedSender<AppEvent>,
    /// Owned by the main loop.
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the task that turns terminal input and timers into `AppEvent`s.
///
/// `reader.next().fuse()` keeps `select!` from polling a finished stream. Send
/// errors are ignored: once the receiver is gone the process is shutting down.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            tokio::select! {
                _ = tick_tick => {
                    let _ = tx.send(AppEvent::Tick);
                }
                _ = render_tick => {
                    let _ = tx.send(AppEvent::Render);
                }
                maybe_event = crossterm_event => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            let _ = tx.send(AppEvent::Key(key));
                        }
                        Some(Ok(Event::Resize(w, h))) => {
                            let _ = tx.send(AppEvent::Resize(w, h));
                        }
                        Some(Ok(Event::Mouse(mouse))) => {
                            let _ = tx.send(AppEvent::Mouse(mouse));
                        }
                        None => {
                            let _ = tx.send(AppEvent::Quit);
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}
