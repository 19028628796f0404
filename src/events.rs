//! Event types and the main event loop driver for the heat-risk TUI.
//!
//! This module defines the [`Event`] enum (keyboard input, ticks, the
//! geolocation outcome and finished submissions) and the [`EventHandler`],
//! which runs a background task that polls crossterm for key events and
//! emits periodic [`Event::Tick`]s. The main loop in `main.rs` receives
//! events via [`EventHandler::next`]; the acquirer and submission tasks send
//! theirs through [`EventHandler::tx`].

use crate::error::SubmitError;
use crate::location::Acquisition;
use crate::models::RiskResult;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::error;

/// Events processed by the application event loop.
#[derive(Debug)]
pub enum Event {
    /// Periodic tick used for the "Calculating…" spinner.
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// The single start-up geolocation attempt has settled.
    Geolocated(Acquisition),
    /// A submission task finished, successfully or not.
    SubmissionFinished(Result<RiskResult, SubmitError>),
}

/// Multiplexes terminal input and ticks into a single event stream.
///
/// The sender ([`tx`](EventHandler::tx)) can be cloned and handed to other
/// tasks, while the receiver is consumed by [`next`](EventHandler::next) in
/// the main loop.
pub struct EventHandler {
    /// Sender for posting events from background tasks.
    pub tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Creates a new event handler and spawns the input/tick task.
    ///
    /// The spawned task polls crossterm with a timeout of `tick_rate_ms`;
    /// key presses become [`Event::Input`] and each elapsed interval becomes
    /// an [`Event::Tick`]. If the terminal stops answering the task logs the
    /// error and exits, which ends the stream.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));
                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            if event_tx.send(Event::Input(key)).is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Terminal read failed: {}", e);
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        error!("Terminal poll failed: {}", e);
                        break;
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    if event_tx.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Receives the next event from the channel.
    ///
    /// Returns `None` once every sender has been dropped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
