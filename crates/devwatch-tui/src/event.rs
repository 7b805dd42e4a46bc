//! Terminal input and frame pacing for the app loop.
//!
//! [`EventSource`] is polled from the app's own `select!`, next to the sync
//! driver. It redraws only when the app marks the frame dirty, and ticks
//! quickly only while something on screen animates.

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// Upper bound on redraws (~30 FPS).
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Events produced for the app loop.
#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized to (cols, rows).
    Resize(u16, u16),
    /// Clock tick: advances the spinner, expires toasts, ages the
    /// "updated" label.
    Tick,
    /// Time to redraw a dirty frame.
    Render,
}

/// How often the clock should tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// A spinner or a toast is on screen (4 Hz).
    Animating,
    /// Only the "updated" age label moves (1 Hz).
    Idle,
}

impl Pace {
    pub fn period(self) -> Duration {
        match self {
            Self::Animating => Duration::from_millis(250),
            Self::Idle => Duration::from_secs(1),
        }
    }
}

pub struct EventSource {
    input: EventStream,
    frame: Interval,
    tick: Interval,
    pace: Pace,
    dirty: bool,
}

impl EventSource {
    /// Attach to terminal input. Starts dirty so the first frame is drawn
    /// right away.
    pub fn open() -> Self {
        let mut frame = tokio::time::interval(FRAME_INTERVAL);
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            input: EventStream::new(),
            frame,
            tick: clock(Pace::Idle),
            pace: Pace::Idle,
            dirty: true,
        }
    }

    /// Request a redraw on the next frame.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Wait for the next event. `None` once terminal input has ended.
    pub async fn next(&mut self, pace: Pace) -> Option<Event> {
        if pace != self.pace {
            debug!(?pace, "tick pace changed");
            self.pace = pace;
            self.tick = clock(pace);
        }

        loop {
            tokio::select! {
                _ = self.frame.tick(), if self.dirty => {
                    self.dirty = false;
                    return Some(Event::Render);
                }
                _ = self.tick.tick() => return Some(Event::Tick),
                input = self.input.next() => match input {
                    Some(Ok(raw)) => {
                        if let Some(event) = translate(raw) {
                            return Some(event);
                        }
                    }
                    Some(Err(e)) => debug!(error = %e, "terminal input error"),
                    None => return None,
                },
            }
        }
    }
}

fn clock(pace: Pace) -> Interval {
    let period = pace.period();
    let mut tick = tokio::time::interval_at(Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tick
}

/// Keep key presses and resizes; releases, repeats, focus and mouse
/// events are not used.
fn translate(raw: CrosstermEvent) -> Option<Event> {
    match raw {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}
